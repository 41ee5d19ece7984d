//! Error type for `tutti-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;
use tutti_core::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tutti_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl StoreError for Error {
  fn is_transient(&self) -> bool {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _),
      )) => matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked),
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
