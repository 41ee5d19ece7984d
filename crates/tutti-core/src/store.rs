//! Storage traits consumed by the engine.
//!
//! Backends (e.g. `tutti-store-sqlite`) implement all four traits. The engine
//! and the HTTP layer depend on these abstractions, never on a concrete
//! backend.
//!
//! All methods return `Send` futures so the traits can be used from
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  attendance::{AttendanceRecord, AttendanceStatus, NewAttendanceRecord},
  dues::{DuesRecord, DuesUpdate, NewDuesRecord},
  event::{Event, EventFilter, NewEvent},
  member::{Member, MemberUpdate, NewMember},
  period::Period,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error type returned by a storage backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// Whether the failure is transient (store busy, connection dropped) and the
  /// same call may succeed if retried.
  fn is_transient(&self) -> bool;
}

/// Shared error type for all storage traits of one backend.
pub trait StoreBackend: Send + Sync {
  type Error: StoreError;
}

// ─── Conditional create ──────────────────────────────────────────────────────

/// Result of an atomic check-and-create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome<T> {
  /// No record existed for the key; this one was inserted.
  Created(T),
  /// A record already existed for the key and was left untouched.
  AlreadyExists(T),
}

impl<T> CreateOutcome<T> {
  pub fn is_created(&self) -> bool { matches!(self, Self::Created(_)) }

  pub fn into_inner(self) -> T {
    match self {
      Self::Created(t) | Self::AlreadyExists(t) => t,
    }
  }
}

// ─── Member directory ────────────────────────────────────────────────────────

pub trait MemberDirectory: StoreBackend {
  /// Admit a new member. The store assigns the id and creation time.
  fn add_member(
    &self,
    input: NewMember,
  ) -> impl Future<Output = Result<Member, Self::Error>> + Send + '_;

  /// Apply an administrative update. Returns `None` if the member does not
  /// exist.
  fn update_member(
    &self,
    id: Uuid,
    update: MemberUpdate,
  ) -> impl Future<Output = Result<Option<Member>, Self::Error>> + Send + '_;

  fn get_member(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Member>, Self::Error>> + Send + '_;

  /// Every member, active or not.
  fn list_members(
    &self,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + '_;

  fn list_active_members(
    &self,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + '_;
}

// ─── Event catalog ───────────────────────────────────────────────────────────

pub trait EventCatalog: StoreBackend {
  fn add_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// Events matching `filter`, ordered by date.
  fn list_events<'a>(
    &'a self,
    filter: &'a EventFilter,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + 'a;
}

// ─── Dues ledger ─────────────────────────────────────────────────────────────

pub trait DuesLedger: StoreBackend {
  fn find_dues_record(
    &self,
    member_id: Uuid,
    period: Period,
  ) -> impl Future<Output = Result<Option<DuesRecord>, Self::Error>> + Send + '_;

  /// Insert an unpaid record for `(member_id, period)` unless one exists.
  ///
  /// The check and the insert are a single atomic step: concurrent callers
  /// racing on the same key observe exactly one `Created`.
  fn create_dues_record(
    &self,
    input: NewDuesRecord,
  ) -> impl Future<Output = Result<CreateOutcome<DuesRecord>, Self::Error>> + Send + '_;

  /// Record a payment decision. Returns `None` if the record does not exist.
  fn update_dues_record(
    &self,
    dues_id: Uuid,
    update: DuesUpdate,
  ) -> impl Future<Output = Result<Option<DuesRecord>, Self::Error>> + Send + '_;

  fn list_unpaid_dues_records(
    &self,
  ) -> impl Future<Output = Result<Vec<DuesRecord>, Self::Error>> + Send + '_;

  /// A member's records, oldest period first.
  fn list_dues_for_member(
    &self,
    member_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DuesRecord>, Self::Error>> + Send + '_;
}

// ─── Attendance ledger ───────────────────────────────────────────────────────

pub trait AttendanceLedger: StoreBackend {
  fn find_attendance_record(
    &self,
    member_id: Uuid,
    event_date: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Insert a `Pending` record for `(member_id, event_date)` unless one
  /// exists. Atomic in the same sense as
  /// [`DuesLedger::create_dues_record`].
  fn create_attendance_record(
    &self,
    input: NewAttendanceRecord,
  ) -> impl Future<Output = Result<CreateOutcome<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Returns `None` if the record does not exist.
  fn set_attendance_status(
    &self,
    attendance_id: Uuid,
    status: AttendanceStatus,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// All records whose `event_date` is one of `dates`.
  fn list_attendance_records_for_dates<'a>(
    &'a self,
    dates: &'a [NaiveDate],
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + 'a;

  /// The most recent distinct `event_date` values strictly before `before`
  /// that have at least one record, newest first, at most `limit` of them.
  fn list_distinct_past_event_dates(
    &self,
    before: NaiveDate,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<NaiveDate>, Self::Error>> + Send + '_;

  /// A member's records, ordered by date.
  fn list_attendance_for_member(
    &self,
    member_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;
}

// ─── Combined ────────────────────────────────────────────────────────────────

/// A backend providing every store the engine needs.
pub trait Store: MemberDirectory + EventCatalog + DuesLedger + AttendanceLedger {}

impl<T> Store for T where T: MemberDirectory + EventCatalog + DuesLedger + AttendanceLedger {}
