//! Billing periods.
//!
//! A [`Period`] is a calendar month. Periods are totally ordered by a linear
//! index, `year * 12 + month_index`, where `month_index` is 0-based. Because
//! the index is linear, distances across a year boundary need no special
//! casing: December 2024 and January 2025 are one period apart.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A `(year, month)` pair. `month` is 1-based (January = 1).
///
/// Serialises as the string `"YYYY-MM"`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
  // Field order matters: the derived `Ord` compares year first, then month,
  // which agrees with `index()`.
  year:  i32,
  month: u32,
}

impl Period {
  /// Build a period, rejecting months outside `1..=12`.
  pub fn new(year: i32, month: u32) -> Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(Error::InvalidPeriod { year, month });
    }
    Ok(Self { year, month })
  }

  /// The period containing `date`.
  pub fn containing(date: NaiveDate) -> Self {
    Self { year: date.year(), month: date.month() }
  }

  /// The period containing the instant `at` (evaluated in UTC).
  pub fn at(at: DateTime<Utc>) -> Self { Self::containing(at.date_naive()) }

  pub fn year(&self) -> i32 { self.year }

  /// 1-based month of year.
  pub fn month(&self) -> u32 { self.month }

  /// 0-based month of year.
  pub fn month_index(&self) -> u32 { self.month - 1 }

  /// Linear index: `year * 12 + month_index`.
  pub fn index(&self) -> i64 {
    i64::from(self.year) * 12 + i64::from(self.month_index())
  }

  /// Number of periods from `earlier` to `self`. Negative when `earlier` is
  /// actually later.
  pub fn periods_since(&self, earlier: Period) -> i64 {
    self.index() - earlier.index()
  }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}

impl FromStr for Period {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let parse_err = || Error::PeriodParse(s.to_owned());
    let (year, month) = s.trim().rsplit_once('-').ok_or_else(parse_err)?;
    let year: i32 = year.parse().map_err(|_| parse_err())?;
    let month: u32 = month.parse().map_err(|_| parse_err())?;
    Self::new(year, month)
  }
}

impl TryFrom<String> for Period {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Period> for String {
  fn from(p: Period) -> Self { p.to_string() }
}
