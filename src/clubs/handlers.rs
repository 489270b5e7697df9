use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateClubRequest, CreatedClub},
    repo_types::{Club, ClubColumns},
    services,
};
use crate::{
    auth::{AuthUser, Role},
    error::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clubs", get(list_clubs).post(create_club))
        .route("/clubs/capabilities", get(capabilities))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_clubs(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<Club>>> {
    Ok(Json(
        services::list_clubs(state.store.as_ref(), &state.club_columns).await?,
    ))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_club(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateClubRequest>,
) -> AppResult<(StatusCode, Json<CreatedClub>)> {
    user.require(&[Role::Admin])?;
    let created = services::create_club(state.store.as_ref(), &state.club_columns, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Optional columns the server currently believes the schema carries.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn capabilities(State(state): State<AppState>, user: AuthUser) -> Json<ClubColumns> {
    Json(*state.club_columns.read().await)
}
