//! A store wrapper that injects failures into an in-memory `SqliteStore`.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU32, Ordering},
  },
};

use chrono::NaiveDate;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tutti_core::{
  attendance::{AttendanceRecord, AttendanceStatus, NewAttendanceRecord},
  dues::{DuesRecord, DuesUpdate, NewDuesRecord},
  event::{Event, EventFilter, NewEvent},
  member::{Member, MemberUpdate, NewMember},
  period::Period,
  store::{
    AttendanceLedger, CreateOutcome, DuesLedger, EventCatalog, MemberDirectory,
    StoreBackend, StoreError,
  },
};
use tutti_store_sqlite::SqliteStore;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FlakyError {
  #[error(transparent)]
  Inner(#[from] tutti_store_sqlite::Error),

  #[error("injected failure (transient: {transient})")]
  Injected { transient: bool },
}

impl StoreError for FlakyError {
  fn is_transient(&self) -> bool {
    match self {
      Self::Inner(e) => e.is_transient(),
      Self::Injected { transient } => *transient,
    }
  }
}

#[derive(Debug, Clone, Copy)]
enum Plan {
  Permanent,
  /// Fail transiently this many more times, then succeed.
  Transient(u32),
}

pub struct FlakyStore {
  inner:        SqliteStore,
  plans:        Mutex<HashMap<Uuid, Plan>>,
  fail_listing: AtomicBool,
  fail_lookups: AtomicBool,
  create_calls: AtomicU32,
  cancel_after: Mutex<Option<(u32, CancellationToken)>>,
}

impl FlakyStore {
  pub async fn new() -> Self {
    Self {
      inner:        SqliteStore::open_in_memory().await.expect("in-memory store"),
      plans:        Mutex::new(HashMap::new()),
      fail_listing: AtomicBool::new(false),
      fail_lookups: AtomicBool::new(false),
      create_calls: AtomicU32::new(0),
      cancel_after: Mutex::new(None),
    }
  }

  /// Every create for `member_id` fails permanently.
  pub fn fail_member(&self, member_id: Uuid) {
    self.plans.lock().unwrap().insert(member_id, Plan::Permanent);
  }

  /// The next `times` creates for `member_id` fail transiently.
  pub fn fail_member_transiently(&self, member_id: Uuid, times: u32) {
    self.plans.lock().unwrap().insert(member_id, Plan::Transient(times));
  }

  /// Listing members fails.
  pub fn fail_listing(&self) { self.fail_listing.store(true, Ordering::SeqCst); }

  /// Member and event lookups fail. Adding members and events still works.
  pub fn fail_lookups(&self) { self.fail_lookups.store(true, Ordering::SeqCst); }

  /// Cancel `token` as the `creates`-th create call starts. That create
  /// itself goes through.
  pub fn cancel_after(&self, creates: u32, token: CancellationToken) {
    *self.cancel_after.lock().unwrap() = Some((creates, token));
  }

  pub fn create_calls(&self) -> u32 { self.create_calls.load(Ordering::SeqCst) }

  fn check(&self, member_id: Uuid) -> Result<(), FlakyError> {
    let calls = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some((creates, token)) = self.cancel_after.lock().unwrap().as_ref() {
      if calls >= *creates {
        token.cancel();
      }
    }
    let mut plans = self.plans.lock().unwrap();
    match plans.get_mut(&member_id) {
      Some(Plan::Permanent) => Err(FlakyError::Injected { transient: false }),
      Some(Plan::Transient(0)) | None => Ok(()),
      Some(Plan::Transient(n)) => {
        *n -= 1;
        Err(FlakyError::Injected { transient: true })
      }
    }
  }

  fn check_lookup(&self) -> Result<(), FlakyError> {
    if self.fail_lookups.load(Ordering::SeqCst) {
      return Err(FlakyError::Injected { transient: false });
    }
    Ok(())
  }

  fn check_listing(&self) -> Result<(), FlakyError> {
    if self.fail_listing.load(Ordering::SeqCst) {
      return Err(FlakyError::Injected { transient: false });
    }
    Ok(())
  }
}

impl StoreBackend for FlakyStore {
  type Error = FlakyError;
}

impl MemberDirectory for FlakyStore {
  async fn add_member(&self, input: NewMember) -> Result<Member, FlakyError> {
    Ok(self.inner.add_member(input).await?)
  }

  async fn update_member(
    &self,
    id: Uuid,
    update: MemberUpdate,
  ) -> Result<Option<Member>, FlakyError> {
    Ok(self.inner.update_member(id, update).await?)
  }

  async fn get_member(&self, id: Uuid) -> Result<Option<Member>, FlakyError> {
    self.check_lookup()?;
    Ok(self.inner.get_member(id).await?)
  }

  async fn list_members(&self) -> Result<Vec<Member>, FlakyError> {
    self.check_listing()?;
    Ok(self.inner.list_members().await?)
  }

  async fn list_active_members(&self) -> Result<Vec<Member>, FlakyError> {
    self.check_listing()?;
    Ok(self.inner.list_active_members().await?)
  }
}

impl EventCatalog for FlakyStore {
  async fn add_event(&self, input: NewEvent) -> Result<Event, FlakyError> {
    Ok(self.inner.add_event(input).await?)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>, FlakyError> {
    self.check_lookup()?;
    Ok(self.inner.get_event(id).await?)
  }

  async fn list_events<'a>(
    &'a self,
    filter: &'a EventFilter,
  ) -> Result<Vec<Event>, FlakyError> {
    self.check_lookup()?;
    Ok(self.inner.list_events(filter).await?)
  }
}

impl DuesLedger for FlakyStore {
  async fn find_dues_record(
    &self,
    member_id: Uuid,
    period: Period,
  ) -> Result<Option<DuesRecord>, FlakyError> {
    Ok(self.inner.find_dues_record(member_id, period).await?)
  }

  async fn create_dues_record(
    &self,
    input: NewDuesRecord,
  ) -> Result<CreateOutcome<DuesRecord>, FlakyError> {
    self.check(input.member_id)?;
    Ok(self.inner.create_dues_record(input).await?)
  }

  async fn update_dues_record(
    &self,
    dues_id: Uuid,
    update: DuesUpdate,
  ) -> Result<Option<DuesRecord>, FlakyError> {
    Ok(self.inner.update_dues_record(dues_id, update).await?)
  }

  async fn list_unpaid_dues_records(&self) -> Result<Vec<DuesRecord>, FlakyError> {
    Ok(self.inner.list_unpaid_dues_records().await?)
  }

  async fn list_dues_for_member(
    &self,
    member_id: Uuid,
  ) -> Result<Vec<DuesRecord>, FlakyError> {
    Ok(self.inner.list_dues_for_member(member_id).await?)
  }
}

impl AttendanceLedger for FlakyStore {
  async fn find_attendance_record(
    &self,
    member_id: Uuid,
    event_date: NaiveDate,
  ) -> Result<Option<AttendanceRecord>, FlakyError> {
    Ok(self.inner.find_attendance_record(member_id, event_date).await?)
  }

  async fn create_attendance_record(
    &self,
    input: NewAttendanceRecord,
  ) -> Result<CreateOutcome<AttendanceRecord>, FlakyError> {
    self.check(input.member_id)?;
    Ok(self.inner.create_attendance_record(input).await?)
  }

  async fn set_attendance_status(
    &self,
    attendance_id: Uuid,
    status: AttendanceStatus,
  ) -> Result<Option<AttendanceRecord>, FlakyError> {
    Ok(self.inner.set_attendance_status(attendance_id, status).await?)
  }

  async fn list_attendance_records_for_dates<'a>(
    &'a self,
    dates: &'a [NaiveDate],
  ) -> Result<Vec<AttendanceRecord>, FlakyError> {
    Ok(self.inner.list_attendance_records_for_dates(dates).await?)
  }

  async fn list_distinct_past_event_dates(
    &self,
    before: NaiveDate,
    limit: usize,
  ) -> Result<Vec<NaiveDate>, FlakyError> {
    Ok(self.inner.list_distinct_past_event_dates(before, limit).await?)
  }

  async fn list_attendance_for_member(
    &self,
    member_id: Uuid,
  ) -> Result<Vec<AttendanceRecord>, FlakyError> {
    Ok(self.inner.list_attendance_for_member(member_id).await?)
  }
}
