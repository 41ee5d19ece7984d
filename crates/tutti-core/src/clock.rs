//! Time source injected into every time-dependent computation.

use chrono::{DateTime, NaiveDate, Utc};

use crate::period::Period;

/// Supplies "now". The engine never reads the wall clock directly.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  /// The current calendar date (UTC).
  fn today(&self) -> NaiveDate { self.now().date_naive() }

  /// The billing period containing [`Clock::now`].
  fn current_period(&self) -> Period { Period::at(self.now()) }
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
  /// A clock frozen at midday UTC on `date`.
  pub fn on(date: NaiveDate) -> Self {
    let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
    Self(noon.and_utc())
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> { self.0 }
}
