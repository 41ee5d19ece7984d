//! Engine tuning knobs.

use std::time::Duration;

use serde::Deserialize;

/// Deserialised from the `[engine]` table of the server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Maximum number of per-unit creations in flight at once.
  pub concurrency:      usize,
  /// Attempts per unit when the store reports a transient failure.
  pub max_attempts:     u32,
  /// Pause between attempts.
  pub retry_backoff_ms: u64,
}

impl EngineConfig {
  pub fn retry_backoff(&self) -> Duration { Duration::from_millis(self.retry_backoff_ms) }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      concurrency:      8,
      max_attempts:     3,
      retry_backoff_ms: 200,
    }
  }
}
