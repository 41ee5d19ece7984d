//! The Tutti compliance engine.
//!
//! [`Engine`] ties the store traits from `tutti-core` to an injected
//! [`Clock`](tutti_core::clock::Clock) and provides:
//!
//! - the recurring fee generator ([`Engine::generate_dues_for_period`],
//!   [`Engine::backfill_dues_for_member`]);
//! - the attendance record seeder ([`Engine::seed_attendance_for_member`],
//!   [`Engine::seed_attendance_for_event`]);
//! - the compliance analyzer ([`Engine::compliance_snapshot`]).
//!
//! The engine spawns no background tasks. Each call is a bounded unit of work
//! that fans out per-member or per-event creations over a small worker pool.

mod attendance;
mod batch;
mod compliance;
mod dues;
mod engine;
mod retry;

pub mod config;
pub mod error;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests;
