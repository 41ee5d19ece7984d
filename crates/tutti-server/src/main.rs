//! tutti-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, serves the JSON API over HTTP and, unless
//! disabled, generates each period's dues on a timer.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tutti_core::clock::SystemClock;
use tutti_engine::{CancellationToken, Engine};
use tutti_server::{ServerConfig, router, spawn_scheduler};
use tutti_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Tutti membership compliance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let engine = Arc::new(Engine::new(
    Arc::new(store),
    Arc::new(SystemClock),
    server_cfg.engine.clone(),
  ));
  let shutdown = CancellationToken::new();

  let scheduler = server_cfg
    .scheduler
    .enabled
    .then(|| spawn_scheduler(engine.clone(), &server_cfg.scheduler, shutdown.clone()));

  let app = router(engine, shutdown.clone());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    .context("server error")?;

  shutdown.cancel();
  if let Some(handle) = scheduler {
    handle.await.context("scheduler task panicked")?;
  }

  Ok(())
}

/// Resolves on Ctrl-C, cancelling `shutdown` so running batches stop
/// starting new units.
async fn shutdown_signal(shutdown: CancellationToken) {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
  }
  tracing::info!("shutting down");
  shutdown.cancel();
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
