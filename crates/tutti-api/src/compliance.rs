//! `GET /compliance`

use axum::extract::State;
use tutti_core::{compliance::ComplianceSnapshot, store::Store};

use crate::{ApiState, error::ApiError, extract::Json};

/// `GET /compliance`: overdue-fee and repeated-absence counts as of now.
pub async fn snapshot<S: Store>(
  State(state): State<ApiState<S>>,
) -> Result<Json<ComplianceSnapshot>, ApiError> {
  Ok(Json(state.engine.compliance_snapshot(&state.cancel).await?))
}
