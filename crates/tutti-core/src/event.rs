//! Scheduled occurrences: rehearsals and concerts.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Dates are stored as `YYYY-MM-DD` text and compared lexically, which only
/// orders correctly for four-digit years.
pub fn check_date(date: NaiveDate) -> Result<()> {
  if (0..=9999).contains(&date.year()) {
    Ok(())
  } else {
    Err(Error::DateOutOfRange(date))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
  Rehearsal,
  Concert,
}

impl EventKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Rehearsal => "rehearsal",
      Self::Concert => "concert",
    }
  }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl FromStr for EventKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "rehearsal" => Ok(Self::Rehearsal),
      "concert" => Ok(Self::Concert),
      other => Err(Error::UnknownEventKind(other.to_owned())),
    }
  }
}

/// A scheduled occurrence. The date carries no time-of-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub event_id: Uuid,
  pub kind:     EventKind,
  pub date:     NaiveDate,
  pub title:    String,
}

impl Event {
  /// Rehearsals on or after `today` get attendance placeholders.
  pub fn is_seedable(&self, today: NaiveDate) -> bool {
    self.kind == EventKind::Rehearsal && self.date >= today
  }
}

/// Input to [`crate::store::EventCatalog::add_event`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
  pub kind:  EventKind,
  pub date:  NaiveDate,
  pub title: String,
}

impl NewEvent {
  pub fn validate(&self) -> Result<()> { check_date(self.date) }
}

/// Parameters for [`crate::store::EventCatalog::list_events`]. Date bounds are
/// inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
  pub kind:      Option<EventKind>,
  pub date_from: Option<NaiveDate>,
  pub date_to:   Option<NaiveDate>,
}

impl EventFilter {
  pub fn validate(&self) -> Result<()> {
    self.date_from.into_iter().chain(self.date_to).try_for_each(check_date)
  }

  /// Rehearsals dated `from` or later.
  pub fn rehearsals_from(from: NaiveDate) -> Self {
    Self {
      kind:      Some(EventKind::Rehearsal),
      date_from: Some(from),
      date_to:   None,
    }
  }
}
