//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tutti_core::store::StoreError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The server is shutting down.
  #[error("operation cancelled")]
  Cancelled,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E: StoreError>(e: E) -> Self { Self::Store(Box::new(e)) }
}

/// Core validation failures are the client's fault.
impl From<tutti_core::Error> for ApiError {
  fn from(e: tutti_core::Error) -> Self { Self::BadRequest(e.to_string()) }
}

impl From<tutti_engine::Error> for ApiError {
  fn from(e: tutti_engine::Error) -> Self {
    use tutti_engine::Error;
    match e {
      Error::MemberNotFound(id) => Self::NotFound(format!("member {id} not found")),
      Error::EventNotFound(id) => Self::NotFound(format!("event {id} not found")),
      Error::Cancelled => Self::Cancelled,
      Error::Store(e) => Self::Store(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { Self::BadRequest(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { Self::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { Self::BadRequest(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure while handling request");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
