//! Dues ledger records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::Period;

/// One member's dues for one period. At most one exists per
/// `(member_id, period)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuesRecord {
  pub dues_id:    Uuid,
  pub member_id:  Uuid,
  pub period:     Period,
  pub paid:       bool,
  pub note:       Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::DuesLedger::create_dues_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewDuesRecord {
  pub member_id: Uuid,
  pub period:    Period,
}

impl NewDuesRecord {
  pub fn new(member_id: Uuid, period: Period) -> Self { Self { member_id, period } }
}

/// A change to the payment state of a dues record, made by the treasurer.
#[derive(Debug, Clone, Deserialize)]
pub struct DuesUpdate {
  pub paid: bool,
  /// `None` keeps the existing note.
  pub note: Option<String>,
}
