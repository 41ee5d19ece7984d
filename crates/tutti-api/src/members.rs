//! Handlers for `/members` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/members` | Optional `?active=true` |
//! | `POST`  | `/members` | Body: [`NewMember`]; returns 201 + [`Admission`] |
//! | `GET`   | `/members/:id` | 404 if not found |
//! | `PATCH` | `/members/:id` | Body: [`MemberUpdate`] |

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tutti_core::{
  member::{Member, MemberUpdate, NewMember},
  report::Admission,
  store::Store,
};
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{Json, Path, Query},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub active: bool,
}

/// `GET /members[?active=true]`
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Member>>, ApiError> {
  let store = state.engine.store();
  let members = if params.active {
    store.list_active_members().await
  } else {
    store.list_members().await
  }
  .map_err(ApiError::store)?;
  Ok(Json(members))
}

// ─── Admit ────────────────────────────────────────────────────────────────────

/// `POST /members` adds the member, backfills the current period's dues
/// and seeds upcoming rehearsals.
pub async fn admit<S: Store>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewMember>,
) -> Result<impl IntoResponse, ApiError> {
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("member name must not be empty".into()));
  }
  let admission: Admission = state.engine.admit_member(body, &state.cancel).await?;
  Ok((StatusCode::CREATED, Json(admission)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /members/:id`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Member>, ApiError> {
  let member = state
    .engine
    .store()
    .get_member(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("member {id} not found")))?;
  Ok(Json(member))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /members/:id`. Only the fields present in the body change.
pub async fn update<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MemberUpdate>,
) -> Result<Json<Member>, ApiError> {
  if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
    return Err(ApiError::BadRequest("member name must not be empty".into()));
  }
  let member = state
    .engine
    .store()
    .update_member(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("member {id} not found")))?;
  tracing::info!(member_id = %id, active = member.active, suspended = member.suspended, "member updated");
  Ok(Json(member))
}
