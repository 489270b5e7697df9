use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{GradeSheet, SaveMarksRequest, SaveMarksResponse, SheetQuery},
    services,
};
use crate::{
    academics::repo_types::AllocationView,
    auth::{AuthUser, Role},
    error::AppResult,
    state::AppState,
};

const TEACHER: &[Role] = &[Role::Teacher];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/gradebook/allocations", get(my_allocations))
        .route("/gradebook/allocations/:id/sheet", get(sheet))
        .route("/gradebook/allocations/:id/marks", put(save_marks))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn my_allocations(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<AllocationView>>> {
    user.require(TEACHER)?;
    Ok(Json(services::my_allocations(state.store.as_ref(), user.id).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn sheet(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<SheetQuery>,
) -> AppResult<Json<GradeSheet>> {
    user.require(TEACHER)?;
    Ok(Json(
        services::load_sheet(state.store.as_ref(), user.id, id, q.assessment, q.limit).await?,
    ))
}

#[instrument(skip(state, payload), fields(user_id = %user.id, cells = payload.cells.len()))]
pub async fn save_marks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveMarksRequest>,
) -> AppResult<Json<SaveMarksResponse>> {
    user.require(TEACHER)?;
    Ok(Json(
        services::save_marks(state.store.as_ref(), user.id, id, payload).await?,
    ))
}
