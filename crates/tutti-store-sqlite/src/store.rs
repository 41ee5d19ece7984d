//! The SQLite implementation of the Tutti store traits.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use tutti_core::{
  attendance::{AttendanceRecord, AttendanceStatus, NewAttendanceRecord},
  dues::{DuesRecord, DuesUpdate, NewDuesRecord},
  event::{Event, EventFilter, NewEvent},
  member::{Member, MemberUpdate, NewMember},
  period::Period,
  store::{
    AttendanceLedger, CreateOutcome, DuesLedger, EventCatalog, MemberDirectory,
    StoreBackend,
  },
};

use crate::{
  encode::{
    ATTENDANCE_COLUMNS, DUES_COLUMNS, EVENT_COLUMNS, MEMBER_COLUMNS,
    RawAttendance, RawDues, RawEvent, RawMember, decode_date, encode_date,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Member directory, event catalog and both ledgers in a single SQLite file.
///
/// Cloning is cheap; the connection handle is shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema initialised");
    Ok(())
  }

  async fn query_members(&self, active_only: bool) -> Result<Vec<Member>> {
    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let sql = if active_only {
          format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE active = 1 ORDER BY created_at"
          )
        } else {
          format!("SELECT {MEMBER_COLUMNS} FROM members ORDER BY created_at")
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawMember::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMember::into_member).collect()
  }
}

impl StoreBackend for SqliteStore {
  type Error = Error;
}

// ─── MemberDirectory impl ────────────────────────────────────────────────────

impl MemberDirectory for SqliteStore {
  async fn add_member(&self, input: NewMember) -> Result<Member> {
    let member = Member {
      member_id:  Uuid::new_v4(),
      name:       input.name,
      active:     input.active,
      suspended:  input.suspended,
      role:       input.role,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(member.member_id);
    let name     = member.name.clone();
    let role_str = member.role.as_str();
    let at_str   = encode_dt(member.created_at);
    let active    = member.active;
    let suspended = member.suspended;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO members (member_id, name, active, suspended, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, active, suspended, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(member)
  }

  async fn update_member(
    &self,
    id:     Uuid,
    update: MemberUpdate,
  ) -> Result<Option<Member>> {
    let id_str   = encode_uuid(id);
    let role_str = update.role.map(|r| r.as_str());

    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE members SET
             name      = COALESCE(?2, name),
             active    = COALESCE(?3, active),
             suspended = COALESCE(?4, suspended),
             role      = COALESCE(?5, role)
           WHERE member_id = ?1",
          rusqlite::params![id_str, update.name, update.active, update.suspended, role_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(conn
          .query_row(
            &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?1"),
            rusqlite::params![id_str],
            RawMember::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMember::into_member).transpose()
  }

  async fn get_member(&self, id: Uuid) -> Result<Option<Member>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?1"),
            rusqlite::params![id_str],
            RawMember::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMember::into_member).transpose()
  }

  async fn list_members(&self) -> Result<Vec<Member>> {
    self.query_members(false).await
  }

  async fn list_active_members(&self) -> Result<Vec<Member>> {
    self.query_members(true).await
  }
}

// ─── EventCatalog impl ───────────────────────────────────────────────────────

impl EventCatalog for SqliteStore {
  async fn add_event(&self, input: NewEvent) -> Result<Event> {
    let event = Event {
      event_id: Uuid::new_v4(),
      kind:     input.kind,
      date:     input.date,
      title:    input.title,
    };

    let id_str   = encode_uuid(event.event_id);
    let kind_str = event.kind.as_str();
    let date_str = encode_date(event.date);
    let title    = event.title.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (event_id, kind, event_date, title) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, kind_str, date_str, title],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
            rusqlite::params![id_str],
            RawEvent::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events<'a>(&'a self, filter: &'a EventFilter) -> Result<Vec<Event>> {
    let kind_str = filter.kind.map(|k| k.as_str());
    let from_str = filter.date_from.map(encode_date);
    let to_str   = filter.date_to.map(encode_date);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events
           WHERE (?1 IS NULL OR kind = ?1)
             AND (?2 IS NULL OR event_date >= ?2)
             AND (?3 IS NULL OR event_date <= ?3)
           ORDER BY event_date, title"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![kind_str, from_str, to_str], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}

// ─── DuesLedger impl ─────────────────────────────────────────────────────────

impl DuesLedger for SqliteStore {
  async fn find_dues_record(
    &self,
    member_id: Uuid,
    period:    Period,
  ) -> Result<Option<DuesRecord>> {
    let member_str = encode_uuid(member_id);
    let (year, month) = (period.year(), period.month());

    let raw: Option<RawDues> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {DUES_COLUMNS} FROM dues_records
               WHERE member_id = ?1 AND period_year = ?2 AND period_month = ?3"
            ),
            rusqlite::params![member_str, year, month],
            RawDues::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDues::into_record).transpose()
  }

  async fn create_dues_record(
    &self,
    input: NewDuesRecord,
  ) -> Result<CreateOutcome<DuesRecord>> {
    let dues_str   = encode_uuid(Uuid::new_v4());
    let member_str = encode_uuid(input.member_id);
    let at_str     = encode_dt(Utc::now());
    let (year, month) = (input.period.year(), input.period.month());

    // The insert is a no-op when the (member, period) key is taken; the
    // follow-up read returns whichever row won.
    let (inserted, raw): (bool, RawDues) = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO dues_records (dues_id, member_id, period_year, period_month, paid, created_at)
           VALUES (?1, ?2, ?3, ?4, 0, ?5)
           ON CONFLICT (member_id, period_year, period_month) DO NOTHING",
          rusqlite::params![dues_str, member_str, year, month, at_str],
        )?;
        let raw = conn.query_row(
          &format!(
            "SELECT {DUES_COLUMNS} FROM dues_records
             WHERE member_id = ?1 AND period_year = ?2 AND period_month = ?3"
          ),
          rusqlite::params![member_str, year, month],
          RawDues::from_row,
        )?;
        Ok((inserted == 1, raw))
      })
      .await?;

    let record = raw.into_record()?;
    Ok(if inserted {
      CreateOutcome::Created(record)
    } else {
      CreateOutcome::AlreadyExists(record)
    })
  }

  async fn update_dues_record(
    &self,
    dues_id: Uuid,
    update:  DuesUpdate,
  ) -> Result<Option<DuesRecord>> {
    let id_str = encode_uuid(dues_id);

    let raw: Option<RawDues> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE dues_records SET paid = ?2, note = COALESCE(?3, note) WHERE dues_id = ?1",
          rusqlite::params![id_str, update.paid, update.note],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(conn
          .query_row(
            &format!("SELECT {DUES_COLUMNS} FROM dues_records WHERE dues_id = ?1"),
            rusqlite::params![id_str],
            RawDues::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDues::into_record).transpose()
  }

  async fn list_unpaid_dues_records(&self) -> Result<Vec<DuesRecord>> {
    let raws: Vec<RawDues> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DUES_COLUMNS} FROM dues_records
           WHERE paid = 0
           ORDER BY period_year, period_month"
        ))?;
        let rows = stmt
          .query_map([], RawDues::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDues::into_record).collect()
  }

  async fn list_dues_for_member(&self, member_id: Uuid) -> Result<Vec<DuesRecord>> {
    let member_str = encode_uuid(member_id);

    let raws: Vec<RawDues> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DUES_COLUMNS} FROM dues_records
           WHERE member_id = ?1
           ORDER BY period_year, period_month"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![member_str], RawDues::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDues::into_record).collect()
  }
}

// ─── AttendanceLedger impl ───────────────────────────────────────────────────

impl AttendanceLedger for SqliteStore {
  async fn find_attendance_record(
    &self,
    member_id:  Uuid,
    event_date: NaiveDate,
  ) -> Result<Option<AttendanceRecord>> {
    let member_str = encode_uuid(member_id);
    let date_str   = encode_date(event_date);

    let raw: Option<RawAttendance> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
               WHERE member_id = ?1 AND event_date = ?2"
            ),
            rusqlite::params![member_str, date_str],
            RawAttendance::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAttendance::into_record).transpose()
  }

  async fn create_attendance_record(
    &self,
    input: NewAttendanceRecord,
  ) -> Result<CreateOutcome<AttendanceRecord>> {
    let id_str     = encode_uuid(Uuid::new_v4());
    let member_str = encode_uuid(input.member_id);
    let date_str   = encode_date(input.event_date);
    let status_str = AttendanceStatus::Pending.as_str();
    let at_str     = encode_dt(Utc::now());

    let (inserted, raw): (bool, RawAttendance) = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO attendance_records (attendance_id, member_id, event_date, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (member_id, event_date) DO NOTHING",
          rusqlite::params![id_str, member_str, date_str, status_str, at_str],
        )?;
        let raw = conn.query_row(
          &format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
             WHERE member_id = ?1 AND event_date = ?2"
          ),
          rusqlite::params![member_str, date_str],
          RawAttendance::from_row,
        )?;
        Ok((inserted == 1, raw))
      })
      .await?;

    let record = raw.into_record()?;
    Ok(if inserted {
      CreateOutcome::Created(record)
    } else {
      CreateOutcome::AlreadyExists(record)
    })
  }

  async fn set_attendance_status(
    &self,
    attendance_id: Uuid,
    status:        AttendanceStatus,
  ) -> Result<Option<AttendanceRecord>> {
    let id_str     = encode_uuid(attendance_id);
    let status_str = status.as_str();

    let raw: Option<RawAttendance> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE attendance_records SET status = ?2 WHERE attendance_id = ?1",
          rusqlite::params![id_str, status_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(conn
          .query_row(
            &format!(
              "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records WHERE attendance_id = ?1"
            ),
            rusqlite::params![id_str],
            RawAttendance::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAttendance::into_record).transpose()
  }

  async fn list_attendance_records_for_dates<'a>(
    &'a self,
    dates: &'a [NaiveDate],
  ) -> Result<Vec<AttendanceRecord>> {
    if dates.is_empty() {
      return Ok(Vec::new());
    }
    let date_strs: Vec<String> = dates.iter().copied().map(encode_date).collect();

    let raws: Vec<RawAttendance> = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; date_strs.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
          "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
           WHERE event_date IN ({placeholders})"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(date_strs.iter()),
            RawAttendance::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendance::into_record).collect()
  }

  async fn list_distinct_past_event_dates(
    &self,
    before: NaiveDate,
    limit:  usize,
  ) -> Result<Vec<NaiveDate>> {
    let before_str = encode_date(before);
    let limit_val  = limit as i64;

    let raws: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT event_date FROM attendance_records
           WHERE event_date < ?1
           ORDER BY event_date DESC
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![before_str, limit_val], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    raws.iter().map(|s| decode_date(s)).collect()
  }

  async fn list_attendance_for_member(
    &self,
    member_id: Uuid,
  ) -> Result<Vec<AttendanceRecord>> {
    let member_str = encode_uuid(member_id);

    let raws: Vec<RawAttendance> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
           WHERE member_id = ?1
           ORDER BY event_date"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![member_str], RawAttendance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendance::into_record).collect()
  }
}
