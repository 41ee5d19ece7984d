//! Handlers for dues records.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/dues/generate` | Body: `{"period":"YYYY-MM"}`; `period` defaults to the current one |
//! | `PATCH` | `/dues/:id` | Body: `{"paid":true,"note":"..."}` |
//! | `GET`   | `/members/:id/dues` | |
//! | `POST`  | `/members/:id/dues/backfill` | Current period only |

use axum::extract::State;
use serde::Deserialize;
use tutti_core::{
  dues::{DuesRecord, DuesUpdate},
  period::Period,
  report::{Backfill, BatchReport},
  store::Store,
};
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{Json, Path},
};

// ─── Generate ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
  #[serde(default)]
  pub period: Option<Period>,
}

/// `POST /dues/generate`
pub async fn generate<S: Store>(
  State(state): State<ApiState<S>>,
  Json(body): Json<GenerateBody>,
) -> Result<Json<BatchReport>, ApiError> {
  let period = body
    .period
    .unwrap_or_else(|| state.engine.clock().current_period());
  let report = state
    .engine
    .generate_dues_for_period(period, &state.cancel)
    .await?;
  Ok(Json(report))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /dues/:id`
pub async fn update<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<DuesUpdate>,
) -> Result<Json<DuesRecord>, ApiError> {
  let record = state
    .engine
    .store()
    .update_dues_record(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("dues record {id} not found")))?;
  tracing::info!(dues_id = %id, paid = record.paid, "dues record updated");
  Ok(Json(record))
}

// ─── Per member ───────────────────────────────────────────────────────────────

/// `GET /members/:id/dues`
pub async fn list_for_member<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<DuesRecord>>, ApiError> {
  let store = state.engine.store();
  store
    .get_member(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("member {id} not found")))?;
  let records = store.list_dues_for_member(id).await.map_err(ApiError::store)?;
  Ok(Json(records))
}

/// `POST /members/:id/dues/backfill`
pub async fn backfill<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Backfill>, ApiError> {
  Ok(Json(state.engine.backfill_dues_for_member(id).await?))
}
