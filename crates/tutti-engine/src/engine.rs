//! [`Engine`] and the admission flows that chain several operations.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tutti_core::{
  clock::Clock,
  event::NewEvent,
  member::NewMember,
  report::{Admission, Backfill, BatchReport, Scheduled},
  store::Store,
};

use crate::{EngineConfig, Error, Result};

/// The membership compliance engine over a store backend `S`.
///
/// Cloning is cheap; the store and clock are shared.
pub struct Engine<S> {
  pub(crate) store:  Arc<S>,
  pub(crate) clock:  Arc<dyn Clock>,
  pub(crate) config: EngineConfig,
}

impl<S> Clone for Engine<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      clock:  Arc::clone(&self.clock),
      config: self.config.clone(),
    }
  }
}

impl<S: Store> Engine<S> {
  pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
    Self { store, clock, config }
  }

  /// The underlying store, for plain reads and administrative updates that do
  /// not go through the engine.
  pub fn store(&self) -> &S { &self.store }

  pub fn clock(&self) -> &dyn Clock { self.clock.as_ref() }

  /// Add a member, then backfill the current period's dues and seed
  /// placeholders for every upcoming rehearsal.
  ///
  /// Only a failure to add the member itself is an error; the follow-up steps
  /// report their failures in the returned [`Admission`].
  pub async fn admit_member(
    &self,
    input: NewMember,
    cancel: &CancellationToken,
  ) -> Result<Admission> {
    let member = self.store.add_member(input).await.map_err(Error::store)?;
    let member_id = member.member_id;
    tracing::info!(%member_id, "member admitted");

    let dues = match self.backfill_dues_for_member(member_id).await {
      Ok(dues) => dues,
      Err(e) => {
        tracing::warn!(%member_id, error = %e, "dues backfill after admission failed");
        Backfill {
          member_id,
          period: self.clock.current_period(),
          outcome: None,
          error: Some(e.to_string()),
        }
      }
    };
    let attendance = match self.seed_attendance_for_member(member_id, cancel).await {
      Ok(report) => report,
      Err(e) => {
        tracing::warn!(%member_id, error = %e, "attendance seeding after admission failed");
        BatchReport::failed(member_id, e.to_string())
      }
    };

    Ok(Admission { member, dues, attendance })
  }

  /// Add an event to the catalog. Upcoming rehearsals are seeded with a
  /// placeholder for every member.
  ///
  /// As with [`Engine::admit_member`], once the event is stored a seeding
  /// failure is reported in [`Scheduled::attendance`], not returned.
  pub async fn schedule_event(
    &self,
    input: NewEvent,
    cancel: &CancellationToken,
  ) -> Result<Scheduled> {
    let event = self.store.add_event(input).await.map_err(Error::store)?;
    tracing::info!(
      event_id = %event.event_id,
      kind = %event.kind,
      date = %event.date,
      "event scheduled"
    );

    let attendance = if !event.is_seedable(self.clock.today()) {
      BatchReport::default()
    } else {
      match self.seed_attendance_for_event(event.event_id, cancel).await {
        Ok(report) => report,
        Err(e) => {
          tracing::warn!(
            event_id = %event.event_id,
            error = %e,
            "attendance seeding after scheduling failed"
          );
          BatchReport::failed(event.event_id, e.to_string())
        }
      }
    };

    Ok(Scheduled { event, attendance })
  }
}
