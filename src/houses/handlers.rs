use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{AwardPoints, CreateHouseRequest},
    repo_types::House,
    services,
};
use crate::{
    academics::dto::SeedReport,
    auth::{AuthUser, Role},
    error::AppResult,
    state::AppState,
};

const ADMIN: &[Role] = &[Role::Admin];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/houses", get(list_houses).post(create_house))
        .route("/houses/seed", post(seed_houses))
        .route("/houses/:id/points", post(award_points))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_houses(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<House>>> {
    Ok(Json(state.store.list_houses().await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_house(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateHouseRequest>,
) -> AppResult<(StatusCode, Json<House>)> {
    user.require(ADMIN)?;
    let house = services::create_house(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(house)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn seed_houses(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<SeedReport>> {
    user.require(ADMIN)?;
    Ok(Json(services::seed_houses(state.store.as_ref()).await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn award_points(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AwardPoints>,
) -> AppResult<Json<House>> {
    user.require(ADMIN)?;
    Ok(Json(services::award_points(state.store.as_ref(), id, payload).await?))
}
