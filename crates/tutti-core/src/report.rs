//! Results of batch record generation.
//!
//! Batch operations never fail because one unit failed. Each unit (one member
//! or one event) is attempted independently and its result is tallied here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  event::Event,
  member::Member,
  period::Period,
  store::CreateOutcome,
};

/// What happened to a single unit that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOutcome {
  Created,
  /// A record already existed for the key; nothing was written.
  DuplicateSkipped,
}

impl<T> From<&CreateOutcome<T>> for UnitOutcome {
  fn from(outcome: &CreateOutcome<T>) -> Self {
    match outcome {
      CreateOutcome::Created(_) => Self::Created,
      CreateOutcome::AlreadyExists(_) => Self::DuplicateSkipped,
    }
  }
}

/// A unit that could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
  /// The member or event the unit was for.
  pub subject_id: Uuid,
  pub error:      String,
  /// How many times the unit was attempted before giving up.
  pub attempts:   u32,
}

/// Tally of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
  pub created:   usize,
  /// Units whose record already existed.
  pub skipped:   usize,
  /// Units never started because the run was cancelled.
  pub cancelled: usize,
  pub failures:  Vec<UnitFailure>,
}

impl BatchReport {
  pub fn total(&self) -> usize {
    self.created + self.skipped + self.cancelled + self.failures.len()
  }

  /// A report for a run that failed before any unit started.
  pub fn failed(subject_id: Uuid, error: String) -> Self {
    Self {
      failures: vec![UnitFailure { subject_id, error, attempts: 1 }],
      ..Self::default()
    }
  }

  /// Every unit ran and none failed.
  pub fn is_clean(&self) -> bool { self.cancelled == 0 && self.failures.is_empty() }
}

/// Result of backfilling the current period's dues for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backfill {
  pub member_id: Uuid,
  pub period:    Period,
  /// `None` when the unit failed; see `error`.
  pub outcome:   Option<UnitOutcome>,
  pub error:     Option<String>,
}

impl Backfill {
  pub fn created(&self) -> bool { self.outcome == Some(UnitOutcome::Created) }
}

/// Result of admitting a new member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admission {
  pub member:     Member,
  pub dues:       Backfill,
  pub attendance: BatchReport,
}

/// Result of adding an event to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduled {
  pub event:      Event,
  /// Empty unless the event is an upcoming rehearsal.
  pub attendance: BatchReport,
}
