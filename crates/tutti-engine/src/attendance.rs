//! Attendance record seeder.

use std::collections::HashSet;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tutti_core::{
  attendance::NewAttendanceRecord,
  event::EventFilter,
  report::{BatchReport, UnitOutcome},
  store::Store,
};
use uuid::Uuid;

use crate::{
  Engine, Error, Result,
  retry::{Exhausted, with_retry},
};

impl<S: Store> Engine<S> {
  /// Create a `Pending` placeholder for `member_id` at every rehearsal dated
  /// today or later. Pairs that already have a record are skipped.
  ///
  /// Units are keyed by event id in the report.
  pub async fn seed_attendance_for_member(
    &self,
    member_id: Uuid,
    cancel: &CancellationToken,
  ) -> Result<BatchReport> {
    self
      .store
      .get_member(member_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::MemberNotFound(member_id))?;

    let today = self.clock.today();
    let filter = EventFilter::rehearsals_from(today);
    let events = self.store.list_events(&filter).await.map_err(Error::store)?;

    // Records are keyed by date, so two rehearsals sharing a date map to a
    // single unit.
    let mut seen = HashSet::new();
    let units = events
      .into_iter()
      .filter(|e| e.is_seedable(today) && seen.insert(e.date))
      .map(|e| (e.event_id, e.date))
      .collect();

    let report = self
      .run_units("attendance", units, cancel, |date| {
        self.create_attendance(member_id, date, cancel)
      })
      .await;

    tracing::info!(
      member_id = %member_id,
      created = report.created,
      skipped = report.skipped,
      cancelled = report.cancelled,
      failed = report.failures.len(),
      "attendance seeding for member finished"
    );
    Ok(report)
  }

  /// Create a `Pending` placeholder for every known member at the rehearsal
  /// `event_id`. Concerts and events dated before today seed nothing.
  ///
  /// Units are keyed by member id in the report.
  pub async fn seed_attendance_for_event(
    &self,
    event_id: Uuid,
    cancel: &CancellationToken,
  ) -> Result<BatchReport> {
    let event = self
      .store
      .get_event(event_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::EventNotFound(event_id))?;

    if !event.is_seedable(self.clock.today()) {
      tracing::debug!(
        event_id = %event_id,
        kind = %event.kind,
        date = %event.date,
        "event is not an upcoming rehearsal; nothing to seed"
      );
      return Ok(BatchReport::default());
    }

    let members = self.store.list_members().await.map_err(Error::store)?;
    let units = members.iter().map(|m| (m.member_id, m.member_id)).collect();
    let date = event.date;

    let report = self
      .run_units("attendance", units, cancel, |member_id| {
        self.create_attendance(member_id, date, cancel)
      })
      .await;

    tracing::info!(
      event_id = %event_id,
      date = %date,
      created = report.created,
      skipped = report.skipped,
      cancelled = report.cancelled,
      failed = report.failures.len(),
      "attendance seeding for event finished"
    );
    Ok(report)
  }

  async fn create_attendance(
    &self,
    member_id: Uuid,
    event_date: NaiveDate,
    cancel: &CancellationToken,
  ) -> Result<UnitOutcome, Exhausted<S::Error>> {
    let created = with_retry(&self.config, cancel, || {
      self
        .store
        .create_attendance_record(NewAttendanceRecord::new(member_id, event_date))
    })
    .await?;

    let outcome = UnitOutcome::from(&created);
    tracing::debug!(member_id = %member_id, date = %event_date, ?outcome, "attendance unit done");
    Ok(outcome)
  }
}
