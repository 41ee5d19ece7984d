//! SQLite backend for the Tutti ledgers.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Uniqueness of dues and attendance
//! records is enforced by UNIQUE constraints, so conditional creates stay
//! atomic even when several processes share the database file.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
