//! Handlers for attendance records.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/members/:id/attendance` | |
//! | `POST`  | `/members/:id/attendance/seed` | Upcoming rehearsals only |
//! | `POST`  | `/events/:id/attendance/seed` | No-op for concerts and past events |
//! | `PATCH` | `/attendance/:id` | Body: `{"status":"present"}` |

use axum::extract::State;
use serde::Deserialize;
use tutti_core::{
  attendance::{AttendanceRecord, AttendanceStatus},
  report::BatchReport,
  store::Store,
};
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{Json, Path},
};

/// `GET /members/:id/attendance`
pub async fn list_for_member<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
  let store = state.engine.store();
  store
    .get_member(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("member {id} not found")))?;
  let records = store
    .list_attendance_for_member(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

/// `POST /members/:id/attendance/seed`
pub async fn seed_for_member<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<BatchReport>, ApiError> {
  let report = state
    .engine
    .seed_attendance_for_member(id, &state.cancel)
    .await?;
  Ok(Json(report))
}

/// `POST /events/:id/attendance/seed`
pub async fn seed_for_event<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<BatchReport>, ApiError> {
  let report = state
    .engine
    .seed_attendance_for_event(id, &state.cancel)
    .await?;
  Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub status: AttendanceStatus,
}

/// `PATCH /attendance/:id`
pub async fn update<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<AttendanceRecord>, ApiError> {
  let record = state
    .engine
    .store()
    .set_attendance_status(id, body.status)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("attendance record {id} not found")))?;
  Ok(Json(record))
}
