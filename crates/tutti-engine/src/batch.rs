//! Fan-out of independent units over a bounded worker pool.

use std::future::Future;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tutti_core::{
  report::{BatchReport, UnitFailure, UnitOutcome},
  store::Store,
};
use uuid::Uuid;

use crate::{Engine, retry::Exhausted};

impl<S: Store> Engine<S> {
  /// Run `unit` for every `(subject_id, input)` pair, at most
  /// `config.concurrency` at a time, and tally the results.
  ///
  /// A failing unit never stops its siblings. Once `cancel` fires, units that
  /// have not started yet are counted as cancelled; units already running
  /// finish normally.
  pub(crate) async fn run_units<T, F, Fut>(
    &self,
    label: &'static str,
    units: Vec<(Uuid, T)>,
    cancel: &CancellationToken,
    unit: F,
  ) -> BatchReport
  where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<UnitOutcome, Exhausted<S::Error>>>,
  {
    let unit = &unit;
    let results: Vec<(Uuid, Option<Result<UnitOutcome, Exhausted<S::Error>>>)> =
      stream::iter(units)
        .map(|(subject_id, input)| async move {
          if cancel.is_cancelled() {
            return (subject_id, None);
          }
          (subject_id, Some(unit(input).await))
        })
        .buffer_unordered(self.config.concurrency.max(1))
        .collect()
        .await;

    let mut report = BatchReport::default();
    for (subject_id, result) in results {
      match result {
        None => report.cancelled += 1,
        Some(Ok(UnitOutcome::Created)) => report.created += 1,
        Some(Ok(UnitOutcome::DuplicateSkipped)) => report.skipped += 1,
        Some(Err(Exhausted { error, attempts })) => {
          tracing::warn!(
            unit = label,
            subject_id = %subject_id,
            attempts,
            %error,
            "unit failed"
          );
          report.failures.push(UnitFailure {
            subject_id,
            error: error.to_string(),
            attempts,
          });
        }
      }
    }
    report
  }
}
