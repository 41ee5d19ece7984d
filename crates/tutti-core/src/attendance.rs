//! Attendance ledger records.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
  /// Placeholder created ahead of the rehearsal.
  #[default]
  Pending,
  Present,
  Absent,
  Excused,
}

impl AttendanceStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Present => "present",
      Self::Absent => "absent",
      Self::Excused => "excused",
    }
  }
}

impl fmt::Display for AttendanceStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl FromStr for AttendanceStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "present" => Ok(Self::Present),
      "absent" => Ok(Self::Absent),
      "excused" => Ok(Self::Excused),
      other => Err(Error::UnknownAttendanceStatus(other.to_owned())),
    }
  }
}

/// A member's attendance at the rehearsal held on `event_date`. The date is a
/// copy of the event's date, not a reference to the event. At most one record
/// exists per `(member_id, event_date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub attendance_id: Uuid,
  pub member_id:     Uuid,
  pub event_date:    NaiveDate,
  pub status:        AttendanceStatus,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::AttendanceLedger::create_attendance_record`].
/// New records always start as [`AttendanceStatus::Pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAttendanceRecord {
  pub member_id:  Uuid,
  pub event_date: NaiveDate,
}

impl NewAttendanceRecord {
  pub fn new(member_id: Uuid, event_date: NaiveDate) -> Self {
    Self { member_id, event_date }
  }
}
