//! HTTP server assembly and the periodic dues scheduler for Tutti.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use serde::Deserialize;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;
use tutti_core::store::Store;
use tutti_engine::{CancellationToken, Engine, EngineConfig};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TUTTI_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub engine:     EngineConfig,
  #[serde(default)]
  pub scheduler:  SchedulerConfig,
}

impl ServerConfig {
  /// Read `file` if it exists, then let `TUTTI_*` variables override it.
  pub fn load(file: &Path) -> Result<Self, config::ConfigError> {
    Self::load_with(file, environment())
  }

  pub(crate) fn load_with(
    file: &Path,
    env: config::Environment,
  ) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }
}

/// `TUTTI_PORT=8080`, `TUTTI_ENGINE__CONCURRENCY=8`, ...
pub fn environment() -> config::Environment {
  config::Environment::with_prefix("TUTTI")
    .prefix_separator("_")
    .separator("__")
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 7070 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/tutti/tutti.db") }

/// The `[scheduler]` table.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
  pub enabled:       bool,
  /// Seconds between dues generation runs.
  pub interval_secs: u64,
}

impl SchedulerConfig {
  pub fn interval(&self) -> Duration { Duration::from_secs(self.interval_secs.max(1)) }
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      enabled:       true,
      interval_secs: 3600,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The JSON API mounted under `/api`, with request tracing.
pub fn router<S>(engine: Arc<Engine<S>>, shutdown: CancellationToken) -> Router
where
  S: Store + 'static,
{
  Router::new()
    .nest("/api", tutti_api::api_router(engine, shutdown))
    .layer(TraceLayer::new_for_http())
}

// ─── Scheduler ────────────────────────────────────────────────────────────────

/// Spawn a task that generates the current period's dues every
/// `config.interval()`, starting immediately. Generation is idempotent, so
/// the records for a new month appear within one interval of it starting.
///
/// The task exits once `shutdown` is cancelled.
pub fn spawn_scheduler<S>(
  engine: Arc<Engine<S>>,
  config: &SchedulerConfig,
  shutdown: CancellationToken,
) -> JoinHandle<()>
where
  S: Store + 'static,
{
  let every = config.interval();
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(interval_secs = every.as_secs(), "dues scheduler started");

    loop {
      tokio::select! {
        biased;
        _ = shutdown.cancelled() => break,
        _ = ticker.tick() => {}
      }

      match engine.generate_current_dues(&shutdown).await {
        Ok(report) if report.is_clean() => {
          tracing::debug!(created = report.created, skipped = report.skipped, "scheduled dues run")
        }
        Ok(report) => tracing::warn!(
          created = report.created,
          failed = report.failures.len(),
          cancelled = report.cancelled,
          "scheduled dues run incomplete"
        ),
        Err(e) => tracing::warn!(error = %e, "scheduled dues run failed"),
      }
    }

    tracing::info!("dues scheduler stopped");
  })
}
