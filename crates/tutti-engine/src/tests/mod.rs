//! Engine tests over an in-memory SQLite store with injectable failures.

mod flaky;

use std::sync::Arc;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tutti_core::{
  attendance::{AttendanceStatus, NewAttendanceRecord},
  clock::FixedClock,
  dues::{DuesUpdate, NewDuesRecord},
  event::{EventKind, NewEvent},
  member::{Member, MemberRole, MemberUpdate, NewMember},
  period::Period,
  report::UnitOutcome,
  store::{AttendanceLedger, DuesLedger, EventCatalog, MemberDirectory},
};
use uuid::Uuid;

use self::flaky::FlakyStore;
use crate::{Engine, EngineConfig, Error};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn period(y: i32, m: u32) -> Period { Period::new(y, m).unwrap() }

fn config() -> EngineConfig {
  EngineConfig { concurrency: 4, max_attempts: 3, retry_backoff_ms: 1 }
}

async fn engine_on(today: NaiveDate) -> Engine<FlakyStore> {
  Engine::new(
    Arc::new(FlakyStore::new().await),
    Arc::new(FixedClock::on(today)),
    config(),
  )
}

async fn add(engine: &Engine<FlakyStore>, name: &str) -> Member {
  engine.store().add_member(NewMember::new(name)).await.unwrap()
}

async fn add_event(
  engine: &Engine<FlakyStore>,
  kind: EventKind,
  on: NaiveDate,
) -> Uuid {
  engine
    .store()
    .add_event(NewEvent { kind, date: on, title: format!("{kind} {on}") })
    .await
    .unwrap()
    .event_id
}

// ─── Dues generation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_dues_is_idempotent() {
  let engine = engine_on(date(2025, 3, 10)).await;
  for name in ["Ada", "Bela", "Clara"] {
    add(&engine, name).await;
  }
  let cancel = CancellationToken::new();

  let first = engine.generate_current_dues(&cancel).await.unwrap();
  assert_eq!(first.created, 3);
  assert_eq!(first.skipped, 0);
  assert!(first.is_clean());

  let second = engine.generate_current_dues(&cancel).await.unwrap();
  assert_eq!(second.created, 0);
  assert_eq!(second.skipped, 3);
}

#[tokio::test]
async fn generate_dues_covers_inactive_and_suspended_members() {
  let engine = engine_on(date(2025, 3, 10)).await;
  add(&engine, "Ada").await;
  let mut retired = NewMember::new("Bela");
  retired.active = false;
  engine.store().add_member(retired).await.unwrap();
  let mut suspended = NewMember::new("Clara");
  suspended.suspended = true;
  engine.store().add_member(suspended).await.unwrap();

  let report = engine
    .generate_dues_for_period(period(2025, 3), &CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(report.created, 3);
}

#[tokio::test]
async fn generate_dues_leaves_paid_records_alone() {
  let engine = engine_on(date(2025, 3, 10)).await;
  let ada = add(&engine, "Ada").await;
  let cancel = CancellationToken::new();

  engine.generate_current_dues(&cancel).await.unwrap();
  let record = engine
    .store()
    .find_dues_record(ada.member_id, period(2025, 3))
    .await
    .unwrap()
    .unwrap();
  engine
    .store()
    .update_dues_record(record.dues_id, DuesUpdate {
      paid: true,
      note: Some("cash".into()),
    })
    .await
    .unwrap();

  let again = engine.generate_current_dues(&cancel).await.unwrap();
  assert_eq!(again.skipped, 1);
  let after = engine
    .store()
    .find_dues_record(ada.member_id, period(2025, 3))
    .await
    .unwrap()
    .unwrap();
  assert!(after.paid);
  assert_eq!(after.note.as_deref(), Some("cash"));
  assert_eq!(after.dues_id, record.dues_id);
}

#[tokio::test]
async fn generate_dues_with_no_members_is_empty() {
  let engine = engine_on(date(2025, 3, 10)).await;
  let report = engine
    .generate_current_dues(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(report.total(), 0);
}

#[tokio::test]
async fn backfill_creates_then_skips() {
  let engine = engine_on(date(2025, 3, 10)).await;
  let ada = add(&engine, "Ada").await;

  let first = engine.backfill_dues_for_member(ada.member_id).await.unwrap();
  assert!(first.created());
  assert_eq!(first.period, period(2025, 3));

  let second = engine.backfill_dues_for_member(ada.member_id).await.unwrap();
  assert_eq!(second.outcome, Some(UnitOutcome::DuplicateSkipped));
  assert_eq!(
    engine
      .store()
      .list_dues_for_member(ada.member_id)
      .await
      .unwrap()
      .len(),
    1
  );
}

#[tokio::test]
async fn backfill_unknown_member_fails() {
  let engine = engine_on(date(2025, 3, 10)).await;
  let missing = Uuid::new_v4();
  let err = engine.backfill_dues_for_member(missing).await.unwrap_err();
  assert!(matches!(err, Error::MemberNotFound(id) if id == missing));
}

#[tokio::test]
async fn backfill_failure_is_reported_not_raised() {
  let engine = engine_on(date(2025, 3, 10)).await;
  let ada = add(&engine, "Ada").await;
  engine.store().fail_member(ada.member_id);

  let backfill = engine.backfill_dues_for_member(ada.member_id).await.unwrap();
  assert!(backfill.outcome.is_none());
  assert!(backfill.error.is_some());
}

// ─── Partial failure, retry, cancellation ────────────────────────────────────

#[tokio::test]
async fn failed_unit_does_not_stop_siblings() {
  let engine = engine_on(date(2025, 3, 10)).await;
  let ada = add(&engine, "Ada").await;
  let bela = add(&engine, "Bela").await;
  let clara = add(&engine, "Clara").await;
  engine.store().fail_member(bela.member_id);

  let report = engine
    .generate_current_dues(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(report.created, 2);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].subject_id, bela.member_id);
  // permanent failures are not retried
  assert_eq!(report.failures[0].attempts, 1);

  for member in [&ada, &clara] {
    assert!(
      engine
        .store()
        .find_dues_record(member.member_id, period(2025, 3))
        .await
        .unwrap()
        .is_some()
    );
  }
}

#[tokio::test]
async fn transient_failure_is_retried() {
  let engine = engine_on(date(2025, 3, 10)).await;
  let ada = add(&engine, "Ada").await;
  engine.store().fail_member_transiently(ada.member_id, 2);

  let report = engine
    .generate_current_dues(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(report.created, 1);
  assert!(report.is_clean());
  assert_eq!(engine.store().create_calls(), 3);
}

#[tokio::test]
async fn transient_failure_gives_up_after_max_attempts() {
  let engine = engine_on(date(2025, 3, 10)).await;
  let ada = add(&engine, "Ada").await;
  engine.store().fail_member_transiently(ada.member_id, 10);

  let report = engine
    .generate_current_dues(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(report.created, 0);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].attempts, 3);
}

#[tokio::test]
async fn member_listing_failure_is_fatal() {
  let engine = engine_on(date(2025, 3, 10)).await;
  add(&engine, "Ada").await;
  engine.store().fail_listing();

  let err = engine
    .generate_current_dues(&CancellationToken::new())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Store(_)));
}

#[tokio::test]
async fn cancelled_run_starts_no_units() {
  let engine = engine_on(date(2025, 3, 10)).await;
  for name in ["Ada", "Bela", "Clara"] {
    add(&engine, name).await;
  }
  let cancel = CancellationToken::new();
  cancel.cancel();

  let report = engine.generate_current_dues(&cancel).await.unwrap();
  assert_eq!(report.cancelled, 3);
  assert_eq!(report.created, 0);
  assert_eq!(engine.store().create_calls(), 0);
}

#[tokio::test]
async fn cancellation_mid_run_stops_remaining_units() {
  let engine = Engine::new(
    Arc::new(FlakyStore::new().await),
    Arc::new(FixedClock::on(date(2025, 3, 10))),
    EngineConfig { concurrency: 1, ..config() },
  );
  let mut members = Vec::new();
  for name in ["Ada", "Bela", "Clara", "Dora", "Emil"] {
    members.push(add(&engine, name).await);
  }
  let cancel = CancellationToken::new();
  engine.store().cancel_after(2, cancel.clone());

  let report = engine.generate_current_dues(&cancel).await.unwrap();
  assert_eq!(report.created, 2);
  assert_eq!(report.cancelled, 3);
  assert_eq!(report.total(), members.len());
  assert!(report.failures.is_empty());

  // every unit either wrote its record or did not touch the store
  let mut stored = 0;
  for member in &members {
    if engine
      .store()
      .find_dues_record(member.member_id, period(2025, 3))
      .await
      .unwrap()
      .is_some()
    {
      stored += 1;
    }
  }
  assert_eq!(stored, report.created);
  assert_eq!(engine.store().create_calls(), 2);
}

// ─── Attendance seeding ──────────────────────────────────────────────────────

#[tokio::test]
async fn seed_for_member_covers_upcoming_rehearsals_only() {
  let today = date(2025, 5, 14);
  let engine = engine_on(today).await;
  let ada = add(&engine, "Ada").await;
  add_event(&engine, EventKind::Rehearsal, date(2025, 5, 7)).await;
  add_event(&engine, EventKind::Rehearsal, today).await;
  add_event(&engine, EventKind::Rehearsal, date(2025, 5, 21)).await;
  add_event(&engine, EventKind::Concert, date(2025, 5, 28)).await;
  let cancel = CancellationToken::new();

  let report = engine
    .seed_attendance_for_member(ada.member_id, &cancel)
    .await
    .unwrap();
  assert_eq!(report.created, 2);

  let mut dates: Vec<_> = engine
    .store()
    .list_attendance_for_member(ada.member_id)
    .await
    .unwrap()
    .into_iter()
    .map(|r| {
      assert_eq!(r.status, AttendanceStatus::Pending);
      r.event_date
    })
    .collect();
  dates.sort();
  assert_eq!(dates, vec![today, date(2025, 5, 21)]);

  let again = engine
    .seed_attendance_for_member(ada.member_id, &cancel)
    .await
    .unwrap();
  assert_eq!(again.created, 0);
  assert_eq!(again.skipped, 2);
}

#[tokio::test]
async fn seed_for_member_with_no_rehearsals_is_empty() {
  let engine = engine_on(date(2025, 5, 14)).await;
  let ada = add(&engine, "Ada").await;
  let report = engine
    .seed_attendance_for_member(ada.member_id, &CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(report.total(), 0);
}

#[tokio::test]
async fn seed_for_member_unknown_member_fails() {
  let engine = engine_on(date(2025, 5, 14)).await;
  let err = engine
    .seed_attendance_for_member(Uuid::new_v4(), &CancellationToken::new())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MemberNotFound(_)));
}

#[tokio::test]
async fn seed_for_event_covers_every_member() {
  let engine = engine_on(date(2025, 5, 14)).await;
  add(&engine, "Ada").await;
  let mut retired = NewMember::new("Bela");
  retired.active = false;
  engine.store().add_member(retired).await.unwrap();
  let rehearsal = add_event(&engine, EventKind::Rehearsal, date(2025, 5, 21)).await;

  let report = engine
    .seed_attendance_for_event(rehearsal, &CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(report.created, 2);

  let records = engine
    .store()
    .list_attendance_records_for_dates(&[date(2025, 5, 21)])
    .await
    .unwrap();
  assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn seed_for_past_event_or_concert_does_nothing() {
  let engine = engine_on(date(2025, 5, 14)).await;
  add(&engine, "Ada").await;
  let past = add_event(&engine, EventKind::Rehearsal, date(2025, 5, 7)).await;
  let concert = add_event(&engine, EventKind::Concert, date(2025, 5, 28)).await;
  let cancel = CancellationToken::new();

  for event_id in [past, concert] {
    let report = engine
      .seed_attendance_for_event(event_id, &cancel)
      .await
      .unwrap();
    assert_eq!(report.total(), 0);
  }
  assert_eq!(engine.store().create_calls(), 0);
}

#[tokio::test]
async fn seed_for_event_unknown_event_fails() {
  let engine = engine_on(date(2025, 5, 14)).await;
  let missing = Uuid::new_v4();
  let err = engine
    .seed_attendance_for_event(missing, &CancellationToken::new())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EventNotFound(id) if id == missing));
}

#[tokio::test]
async fn concurrent_seeding_creates_one_record_per_member() {
  let engine = engine_on(date(2025, 5, 14)).await;
  for i in 0..5 {
    add(&engine, &format!("member {i}")).await;
  }
  let rehearsal = add_event(&engine, EventKind::Rehearsal, date(2025, 5, 21)).await;

  let handles: Vec<_> = (0..4)
    .map(|_| {
      let engine = engine.clone();
      tokio::spawn(async move {
        engine
          .seed_attendance_for_event(rehearsal, &CancellationToken::new())
          .await
          .unwrap()
      })
    })
    .collect();

  let mut created = 0;
  let mut skipped = 0;
  for handle in handles {
    let report = handle.await.unwrap();
    created += report.created;
    skipped += report.skipped;
  }
  assert_eq!(created, 5);
  assert_eq!(skipped, 15);

  let records = engine
    .store()
    .list_attendance_records_for_dates(&[date(2025, 5, 21)])
    .await
    .unwrap();
  assert_eq!(records.len(), 5);
}

// ─── Admission flows ─────────────────────────────────────────────────────────

#[tokio::test]
async fn admit_member_backfills_and_seeds() {
  let engine = engine_on(date(2025, 5, 14)).await;
  add_event(&engine, EventKind::Rehearsal, date(2025, 5, 21)).await;
  add_event(&engine, EventKind::Rehearsal, date(2025, 5, 28)).await;

  let admission = engine
    .admit_member(NewMember::new("Ada"), &CancellationToken::new())
    .await
    .unwrap();
  assert!(admission.dues.created());
  assert_eq!(admission.dues.period, period(2025, 5));
  assert_eq!(admission.attendance.created, 2);
}

#[tokio::test]
async fn admit_member_reports_follow_up_failures() {
  let engine = engine_on(date(2025, 5, 14)).await;
  add_event(&engine, EventKind::Rehearsal, date(2025, 5, 21)).await;
  engine.store().fail_lookups();

  let admission = engine
    .admit_member(NewMember::new("Ada"), &CancellationToken::new())
    .await
    .unwrap();
  let member_id = admission.member.member_id;
  assert!(admission.dues.error.is_some());
  assert_eq!(admission.dues.outcome, None);
  assert_eq!(admission.dues.member_id, member_id);
  assert_eq!(admission.dues.period, period(2025, 5));
  assert_eq!(admission.attendance.failures.len(), 1);
  assert_eq!(admission.attendance.failures[0].subject_id, member_id);

  // the member stays admitted exactly once
  let members = engine.store().list_members().await.unwrap();
  assert_eq!(members.len(), 1);
  assert_eq!(members[0].member_id, member_id);
}

#[tokio::test]
async fn schedule_event_reports_seeding_failure() {
  let engine = engine_on(date(2025, 5, 14)).await;
  add(&engine, "Ada").await;
  engine.store().fail_lookups();

  let scheduled = engine
    .schedule_event(
      NewEvent {
        kind:  EventKind::Rehearsal,
        date:  date(2025, 5, 21),
        title: "Sectionals".into(),
      },
      &CancellationToken::new(),
    )
    .await
    .unwrap();
  assert_eq!(scheduled.attendance.failures.len(), 1);
  assert_eq!(scheduled.attendance.failures[0].subject_id, scheduled.event.event_id);
}

#[tokio::test]
async fn schedule_event_seeds_upcoming_rehearsal() {
  let engine = engine_on(date(2025, 5, 14)).await;
  add(&engine, "Ada").await;
  add(&engine, "Bela").await;
  let cancel = CancellationToken::new();

  let rehearsal = engine
    .schedule_event(
      NewEvent {
        kind:  EventKind::Rehearsal,
        date:  date(2025, 5, 21),
        title: "Sectionals".into(),
      },
      &cancel,
    )
    .await
    .unwrap();
  assert_eq!(rehearsal.attendance.created, 2);

  let concert = engine
    .schedule_event(
      NewEvent {
        kind:  EventKind::Concert,
        date:  date(2025, 6, 1),
        title: "Spring concert".into(),
      },
      &cancel,
    )
    .await
    .unwrap();
  assert_eq!(concert.attendance.total(), 0);
}

// ─── Compliance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn overdue_count_is_two_periods_back() {
  let engine = engine_on(date(2025, 11, 15)).await;
  let store = engine.store();
  let sep = add(&engine, "Sep").await;
  let oct = add(&engine, "Oct").await;
  let nov = add(&engine, "Nov").await;
  let paid = add(&engine, "Paid").await;

  for (member, p) in [
    (&sep, period(2025, 9)),
    (&oct, period(2025, 10)),
    (&nov, period(2025, 11)),
    (&paid, period(2025, 8)),
  ] {
    store
      .create_dues_record(NewDuesRecord::new(member.member_id, p))
      .await
      .unwrap();
  }
  let paid_record = store
    .find_dues_record(paid.member_id, period(2025, 8))
    .await
    .unwrap()
    .unwrap();
  store
    .update_dues_record(paid_record.dues_id, DuesUpdate {
      paid: true,
      note: None,
    })
    .await
    .unwrap();

  let snapshot = engine
    .compliance_snapshot(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(snapshot.overdue_fee_count, 1);
  assert_eq!(snapshot.period, period(2025, 11));
}

#[tokio::test]
async fn overdue_member_counted_once() {
  let engine = engine_on(date(2025, 11, 15)).await;
  let ada = add(&engine, "Ada").await;
  for p in [period(2025, 7), period(2025, 8), period(2025, 9)] {
    engine
      .store()
      .create_dues_record(NewDuesRecord::new(ada.member_id, p))
      .await
      .unwrap();
  }

  let snapshot = engine
    .compliance_snapshot(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(snapshot.overdue_fee_count, 1);
}

async fn mark(
  engine: &Engine<FlakyStore>,
  member: &Member,
  on: NaiveDate,
  status: AttendanceStatus,
) {
  let record = engine
    .store()
    .create_attendance_record(NewAttendanceRecord::new(member.member_id, on))
    .await
    .unwrap()
    .into_inner();
  engine
    .store()
    .set_attendance_status(record.attendance_id, status)
    .await
    .unwrap();
}

#[tokio::test]
async fn repeated_absence_needs_all_four_dates() {
  let engine = engine_on(date(2025, 1, 29)).await;
  let dates = [date(2025, 1, 1), date(2025, 1, 8), date(2025, 1, 15), date(2025, 1, 22)];
  for d in dates {
    add_event(&engine, EventKind::Rehearsal, d).await;
  }
  let always_absent = add(&engine, "A").await;
  let once_present = add(&engine, "B").await;

  for d in dates {
    mark(&engine, &always_absent, d, AttendanceStatus::Absent).await;
    let status = if d == date(2025, 1, 15) {
      AttendanceStatus::Present
    } else {
      AttendanceStatus::Absent
    };
    mark(&engine, &once_present, d, status).await;
  }

  let snapshot = engine
    .compliance_snapshot(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(snapshot.repeated_absence_count, 1);
}

#[tokio::test]
async fn repeated_absence_is_zero_with_short_history() {
  let engine = engine_on(date(2025, 1, 29)).await;
  let ada = add(&engine, "Ada").await;
  for d in [date(2025, 1, 15), date(2025, 1, 22)] {
    add_event(&engine, EventKind::Rehearsal, d).await;
    mark(&engine, &ada, d, AttendanceStatus::Absent).await;
  }

  let snapshot = engine
    .compliance_snapshot(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(snapshot.repeated_absence_count, 0);
}

#[tokio::test]
async fn repeated_absence_ignores_exempt_and_suspended_members() {
  let engine = engine_on(date(2025, 1, 29)).await;
  let dates = [date(2025, 1, 1), date(2025, 1, 8), date(2025, 1, 15), date(2025, 1, 22)];
  for d in dates {
    add_event(&engine, EventKind::Rehearsal, d).await;
  }
  let conductor = engine
    .store()
    .add_member(NewMember::new("Maestro").with_role(MemberRole::Conductor))
    .await
    .unwrap();
  let suspended = add(&engine, "Suspended").await;
  engine
    .store()
    .update_member(suspended.member_id, MemberUpdate {
      suspended: Some(true),
      ..Default::default()
    })
    .await
    .unwrap();

  for d in dates {
    mark(&engine, &conductor, d, AttendanceStatus::Absent).await;
    mark(&engine, &suspended, d, AttendanceStatus::Absent).await;
  }

  let snapshot = engine
    .compliance_snapshot(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(snapshot.repeated_absence_count, 0);
}

#[tokio::test]
async fn compliance_on_empty_store_is_zero() {
  let engine = engine_on(date(2025, 1, 29)).await;
  let snapshot = engine
    .compliance_snapshot(&CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(snapshot.overdue_fee_count, 0);
  assert_eq!(snapshot.repeated_absence_count, 0);
}

#[tokio::test]
async fn cancelled_compliance_snapshot_fails() {
  let engine = engine_on(date(2025, 1, 29)).await;
  let cancel = CancellationToken::new();
  cancel.cancel();
  let err = engine.compliance_snapshot(&cancel).await.unwrap_err();
  assert!(matches!(err, Error::Cancelled));
}
