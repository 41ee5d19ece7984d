//! Compliance rules as pure functions over already-fetched ledger data.
//!
//! Nothing here performs I/O. The engine fetches a snapshot of the ledgers and
//! hands it to these functions, so the rules can be tested without a store.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  attendance::{AttendanceRecord, AttendanceStatus},
  dues::DuesRecord,
  member::Member,
  period::Period,
};

/// An unpaid record this many periods old (or older) makes its member
/// delinquent.
pub const OVERDUE_PERIODS: i64 = 2;

/// Number of most recent distinct past rehearsal dates inspected for chronic
/// absence.
pub const ABSENCE_WINDOW: usize = 4;

/// Both compliance counts, evaluated against a single clock reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSnapshot {
  /// Distinct members with an unpaid record at least [`OVERDUE_PERIODS`] old.
  pub overdue_fee_count:      usize,
  /// Eligible members absent on every date of the absence window.
  pub repeated_absence_count: usize,
  /// The period the overdue rule was evaluated against.
  pub period:                 Period,
  pub as_of:                  DateTime<Utc>,
}

// ─── Chronic non-payment ─────────────────────────────────────────────────────

/// Whether an unpaid record for `fee_period` is overdue in `current`.
///
/// Records from a period later than `current` are never overdue.
pub fn is_overdue(fee_period: Period, current: Period) -> bool {
  current.periods_since(fee_period) >= OVERDUE_PERIODS
}

/// Count distinct members owning at least one unpaid record that is overdue
/// relative to `current`. Paid records in `records` are ignored.
pub fn count_overdue_members(records: &[DuesRecord], current: Period) -> usize {
  records
    .iter()
    .filter(|r| !r.paid && is_overdue(r.period, current))
    .map(|r| r.member_id)
    .collect::<HashSet<_>>()
    .len()
}

// ─── Chronic absence ─────────────────────────────────────────────────────────

/// Select the absence window: the [`ABSENCE_WINDOW`] most recent distinct
/// dates strictly before `today`, newest first.
///
/// The window is global; every member is measured against the same dates.
pub fn absence_window(
  dates: impl IntoIterator<Item = NaiveDate>,
  today: NaiveDate,
) -> Vec<NaiveDate> {
  let mut past: Vec<NaiveDate> = dates
    .into_iter()
    .filter(|d| *d < today)
    .collect::<HashSet<_>>()
    .into_iter()
    .collect();
  past.sort_unstable_by(|a, b| b.cmp(a));
  past.truncate(ABSENCE_WINDOW);
  past
}

/// Count eligible members with an `Absent` record on every date of `window`.
///
/// With fewer than [`ABSENCE_WINDOW`] dates in the window nobody can qualify,
/// so the result is zero.
pub fn count_repeated_absences(
  members: &[Member],
  window: &[NaiveDate],
  records: &[AttendanceRecord],
) -> usize {
  let window: HashSet<NaiveDate> = window.iter().copied().collect();
  if window.len() < ABSENCE_WINDOW {
    return 0;
  }

  let mut absences: HashMap<Uuid, HashSet<NaiveDate>> = HashMap::new();
  for record in records {
    if record.status == AttendanceStatus::Absent
      && window.contains(&record.event_date)
    {
      absences
        .entry(record.member_id)
        .or_default()
        .insert(record.event_date);
    }
  }

  members
    .iter()
    .filter(|m| m.is_attendance_eligible())
    .filter(|m| {
      absences
        .get(&m.member_id)
        .is_some_and(|dates| dates.len() == window.len())
    })
    .count()
}
