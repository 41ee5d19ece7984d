//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`
//! (so lexical order is chronological), and UUIDs as hyphenated lowercase
//! strings.

use chrono::{DateTime, NaiveDate, Utc};
use tutti_core::{
  attendance::AttendanceRecord,
  dues::DuesRecord,
  event::Event,
  member::Member,
  period::Period,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const MEMBER_COLUMNS: &str =
  "member_id, name, active, suspended, role, created_at";

/// Raw values read directly from a `members` row.
pub struct RawMember {
  pub member_id:  String,
  pub name:       String,
  pub active:     bool,
  pub suspended:  bool,
  pub role:       String,
  pub created_at: String,
}

impl RawMember {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:  row.get(0)?,
      name:       row.get(1)?,
      active:     row.get(2)?,
      suspended:  row.get(3)?,
      role:       row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_member(self) -> Result<Member> {
    Ok(Member {
      member_id:  decode_uuid(&self.member_id)?,
      name:       self.name,
      active:     self.active,
      suspended:  self.suspended,
      role:       self.role.parse()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const EVENT_COLUMNS: &str = "event_id, kind, event_date, title";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:   String,
  pub kind:       String,
  pub event_date: String,
  pub title:      String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:   row.get(0)?,
      kind:       row.get(1)?,
      event_date: row.get(2)?,
      title:      row.get(3)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id: decode_uuid(&self.event_id)?,
      kind:     self.kind.parse()?,
      date:     decode_date(&self.event_date)?,
      title:    self.title,
    })
  }
}

pub const DUES_COLUMNS: &str =
  "dues_id, member_id, period_year, period_month, paid, note, created_at";

/// Raw values read directly from a `dues_records` row.
pub struct RawDues {
  pub dues_id:      String,
  pub member_id:    String,
  pub period_year:  i64,
  pub period_month: i64,
  pub paid:         bool,
  pub note:         Option<String>,
  pub created_at:   String,
}

impl RawDues {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      dues_id:      row.get(0)?,
      member_id:    row.get(1)?,
      period_year:  row.get(2)?,
      period_month: row.get(3)?,
      paid:         row.get(4)?,
      note:         row.get(5)?,
      created_at:   row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<DuesRecord> {
    let period = Period::new(self.period_year as i32, self.period_month as u32)?;
    Ok(DuesRecord {
      dues_id: decode_uuid(&self.dues_id)?,
      member_id: decode_uuid(&self.member_id)?,
      period,
      paid: self.paid,
      note: self.note,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const ATTENDANCE_COLUMNS: &str =
  "attendance_id, member_id, event_date, status, created_at";

/// Raw values read directly from an `attendance_records` row.
pub struct RawAttendance {
  pub attendance_id: String,
  pub member_id:     String,
  pub event_date:    String,
  pub status:        String,
  pub created_at:    String,
}

impl RawAttendance {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendance_id: row.get(0)?,
      member_id:     row.get(1)?,
      event_date:    row.get(2)?,
      status:        row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      attendance_id: decode_uuid(&self.attendance_id)?,
      member_id:     decode_uuid(&self.member_id)?,
      event_date:    decode_date(&self.event_date)?,
      status:        self.status.parse()?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
