//! Handlers for `/events` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/events` | Optional `?kind=rehearsal\|concert&date_from=&date_to=` |
//! | `POST` | `/events` | Body: [`NewEvent`]; returns 201 + [`Scheduled`]; 400 past year 9999 |
//! | `GET`  | `/events/:id` | 404 if not found |

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use tutti_core::{
  event::{Event, EventFilter, NewEvent},
  report::Scheduled,
  store::Store,
};
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{Json, Path, Query},
};

/// `GET /events[?kind=...][&date_from=YYYY-MM-DD][&date_to=YYYY-MM-DD]`
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<Event>>, ApiError> {
  filter.validate()?;
  let events = state
    .engine
    .store()
    .list_events(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(events))
}

/// `POST /events`. Upcoming rehearsals are seeded for every member.
pub async fn schedule<S: Store>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;
  let scheduled: Scheduled = state.engine.schedule_event(body, &state.cancel).await?;
  Ok((StatusCode::CREATED, Json(scheduled)))
}

/// `GET /events/:id`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
  let event = state
    .engine
    .store()
    .get_event(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  Ok(Json(event))
}
