//! JSON REST API for Tutti.
//!
//! Exposes an axum [`Router`] over a [`tutti_engine::Engine`] for any
//! [`tutti_core::store::Store`] backend. Auth and TLS are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tutti_api::api_router(engine.clone(), shutdown.clone()))
//! ```

pub mod attendance;
pub mod compliance;
pub mod dues;
pub mod error;
pub mod events;
pub mod extract;
pub mod members;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use tutti_core::store::Store;
use tutti_engine::{CancellationToken, Engine};

pub use error::ApiError;

/// Shared handler state.
pub struct ApiState<S> {
  pub engine: Arc<Engine<S>>,
  /// Cancelled on shutdown; batch handlers stop starting new units once it
  /// fires.
  pub cancel: CancellationToken,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      engine: Arc::clone(&self.engine),
      cancel: self.cancel.clone(),
    }
  }
}

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>, cancel: CancellationToken) -> Router<()>
where
  S: Store + 'static,
{
  Router::new()
    // Members
    .route("/members", get(members::list::<S>).post(members::admit::<S>))
    .route("/members/{id}", get(members::get_one::<S>).patch(members::update::<S>))
    .route("/members/{id}/dues", get(dues::list_for_member::<S>))
    .route("/members/{id}/dues/backfill", post(dues::backfill::<S>))
    .route("/members/{id}/attendance", get(attendance::list_for_member::<S>))
    .route("/members/{id}/attendance/seed", post(attendance::seed_for_member::<S>))
    // Events
    .route("/events", get(events::list::<S>).post(events::schedule::<S>))
    .route("/events/{id}", get(events::get_one::<S>))
    .route("/events/{id}/attendance/seed", post(attendance::seed_for_event::<S>))
    // Ledgers
    .route("/dues/generate", post(dues::generate::<S>))
    .route("/dues/{id}", patch(dues::update::<S>))
    .route("/attendance/{id}", patch(attendance::update::<S>))
    // Compliance
    .route("/compliance", get(compliance::snapshot::<S>))
    .with_state(ApiState { engine, cancel })
}
