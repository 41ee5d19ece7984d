//! Core types and trait definitions for Tutti, the ensemble membership
//! compliance engine.
//!
//! Domain types, the store traits, and the compliance rules. No I/O happens
//! here; storage backends and the engine build on top of it.

pub mod attendance;
pub mod clock;
pub mod compliance;
pub mod dues;
pub mod error;
pub mod event;
pub mod member;
pub mod period;
pub mod report;
pub mod store;

pub use error::{Error, Result};
