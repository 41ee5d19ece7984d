//! Error types for `tutti-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid period {year:04}-{month:02}: month must be in 1..=12")]
  InvalidPeriod { year: i32, month: u32 },

  #[error("cannot parse period from {0:?}; expected YYYY-MM")]
  PeriodParse(String),

  #[error("unknown member role: {0:?}")]
  UnknownRole(String),

  #[error("date {0} is outside the supported years 0000..=9999")]
  DateOutOfRange(chrono::NaiveDate),

  #[error("unknown event kind: {0:?}")]
  UnknownEventKind(String),

  #[error("unknown attendance status: {0:?}")]
  UnknownAttendanceStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
