//! Compliance analyzer: fetches ledger snapshots and applies the pure rules
//! from [`tutti_core::compliance`].

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tutti_core::{
  compliance::{
    ABSENCE_WINDOW, ComplianceSnapshot, absence_window, count_overdue_members,
    count_repeated_absences,
  },
  period::Period,
  store::Store,
};

use crate::{Engine, Error, Result};

impl<S: Store> Engine<S> {
  /// Both compliance counts for a single reading of the clock.
  ///
  /// The two counts are computed concurrently. The call returns both or
  /// fails as a whole; it fails with [`Error::Cancelled`] if `cancel` fires
  /// first. No locks are taken, so a record written while the snapshot is
  /// being computed may or may not be reflected.
  pub async fn compliance_snapshot(
    &self,
    cancel: &CancellationToken,
  ) -> Result<ComplianceSnapshot> {
    let as_of = self.clock.now();
    let period = Period::at(as_of);
    let today = as_of.date_naive();

    let work = async {
      tokio::try_join!(self.overdue_fee_count(period), self.repeated_absence_count(today))
    };

    let (overdue_fee_count, repeated_absence_count) = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(Error::Cancelled),
      counts = work => counts?,
    };

    tracing::info!(
      period = %period,
      overdue_fee_count,
      repeated_absence_count,
      "compliance snapshot computed"
    );
    Ok(ComplianceSnapshot { overdue_fee_count, repeated_absence_count, period, as_of })
  }

  async fn overdue_fee_count(&self, current: Period) -> Result<usize> {
    let unpaid = self
      .store
      .list_unpaid_dues_records()
      .await
      .map_err(Error::store)?;
    Ok(count_overdue_members(&unpaid, current))
  }

  async fn repeated_absence_count(&self, today: NaiveDate) -> Result<usize> {
    let dates = self
      .store
      .list_distinct_past_event_dates(today, ABSENCE_WINDOW)
      .await
      .map_err(Error::store)?;
    let window = absence_window(dates, today);
    if window.len() < ABSENCE_WINDOW {
      tracing::debug!(dates = window.len(), "not enough rehearsal history for absence check");
      return Ok(0);
    }

    let (members, records) = tokio::try_join!(
      async { self.store.list_members().await.map_err(Error::store) },
      async {
        self
          .store
          .list_attendance_records_for_dates(&window)
          .await
          .map_err(Error::store)
      },
    )?;
    Ok(count_repeated_absences(&members, &window, &records))
  }
}
