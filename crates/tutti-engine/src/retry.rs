//! Bounded per-unit retry for transient store failures.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tutti_core::store::StoreError;

use crate::EngineConfig;

/// A unit that still failed after its last attempt.
#[derive(Debug)]
pub(crate) struct Exhausted<E> {
  pub error:    E,
  pub attempts: u32,
}

/// Run `op` until it succeeds, fails permanently, or `max_attempts` is used
/// up. Only transient errors are retried, and no retry starts once `cancel`
/// has fired.
pub(crate) async fn with_retry<T, E, F, Fut>(
  config: &EngineConfig,
  cancel: &CancellationToken,
  mut op: F,
) -> Result<T, Exhausted<E>>
where
  E: StoreError,
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
{
  let max_attempts = config.max_attempts.max(1);
  let mut attempt = 1;
  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(error)
        if error.is_transient() && attempt < max_attempts && !cancel.is_cancelled() =>
      {
        tracing::debug!(attempt, %error, "transient store failure; retrying");
        tokio::time::sleep(config.retry_backoff()).await;
        attempt += 1;
      }
      Err(error) => return Err(Exhausted { error, attempts: attempt }),
    }
  }
}
