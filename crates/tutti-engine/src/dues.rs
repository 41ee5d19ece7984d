//! Recurring fee generator.

use tokio_util::sync::CancellationToken;
use tutti_core::{
  dues::NewDuesRecord,
  period::Period,
  report::{Backfill, BatchReport, UnitOutcome},
  store::Store,
};
use uuid::Uuid;

use crate::{
  Engine, Error, Result,
  retry::{Exhausted, with_retry},
};

impl<S: Store> Engine<S> {
  /// Ensure every member has a dues record for `period`.
  ///
  /// All members are included, whether active, inactive or suspended.
  /// Existing records are left exactly as they are, so running this twice
  /// for the same period creates nothing the second time.
  ///
  /// Fails as a whole only if the member list cannot be read.
  pub async fn generate_dues_for_period(
    &self,
    period: Period,
    cancel: &CancellationToken,
  ) -> Result<BatchReport> {
    let members = self.store.list_members().await.map_err(Error::store)?;
    let units = members.iter().map(|m| (m.member_id, m.member_id)).collect();

    let report = self
      .run_units("dues", units, cancel, |member_id| {
        self.create_dues(member_id, period, cancel)
      })
      .await;

    tracing::info!(
      period = %period,
      created = report.created,
      skipped = report.skipped,
      cancelled = report.cancelled,
      failed = report.failures.len(),
      "dues generation finished"
    );
    Ok(report)
  }

  /// [`Engine::generate_dues_for_period`] for the period containing "now".
  pub async fn generate_current_dues(
    &self,
    cancel: &CancellationToken,
  ) -> Result<BatchReport> {
    let period = self.clock.current_period();
    self.generate_dues_for_period(period, cancel).await
  }

  /// Ensure one member has a dues record for the current period.
  ///
  /// Returns [`Error::MemberNotFound`] for an unknown member. A failure to
  /// create the record is reported in [`Backfill::error`].
  pub async fn backfill_dues_for_member(&self, member_id: Uuid) -> Result<Backfill> {
    self
      .store
      .get_member(member_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::MemberNotFound(member_id))?;

    let period = self.clock.current_period();
    let backfill = match self
      .create_dues(member_id, period, &CancellationToken::new())
      .await
    {
      Ok(outcome) => Backfill { member_id, period, outcome: Some(outcome), error: None },
      Err(Exhausted { error, attempts }) => {
        tracing::warn!(member_id = %member_id, period = %period, attempts, %error, "dues backfill failed");
        Backfill { member_id, period, outcome: None, error: Some(error.to_string()) }
      }
    };
    Ok(backfill)
  }

  async fn create_dues(
    &self,
    member_id: Uuid,
    period: Period,
    cancel: &CancellationToken,
  ) -> Result<UnitOutcome, Exhausted<S::Error>> {
    let created = with_retry(&self.config, cancel, || {
      self
        .store
        .create_dues_record(NewDuesRecord::new(member_id, period))
    })
    .await?;

    let outcome = UnitOutcome::from(&created);
    tracing::debug!(member_id = %member_id, period = %period, ?outcome, "dues unit done");
    Ok(outcome)
  }
}
