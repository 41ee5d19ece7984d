//! Error type for `tutti-engine`.

use thiserror::Error;
use tutti_core::store::StoreError;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("member not found: {0}")]
  MemberNotFound(Uuid),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("operation cancelled")]
  Cancelled,

  /// The store could not be read at all (e.g. members could not be listed).
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E: StoreError>(e: E) -> Self { Self::Store(Box::new(e)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
