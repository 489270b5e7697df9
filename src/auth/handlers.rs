use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, SessionResponse},
    jwt::{AuthUser, JwtKeys},
    services,
};
use crate::{error::AppResult, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/session", get(get_session))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let keys = JwtKeys::from_ref(&state);
    let auth = services::register(state.store.as_ref(), &keys, payload).await?;
    Ok((StatusCode::CREATED, Json(auth)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(services::login(state.store.as_ref(), &keys, payload).await?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(
        services::refresh(state.store.as_ref(), &keys, &payload.refresh_token).await?,
    ))
}

/// Tokens are stateless; signing out means the client drops them.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(user: AuthUser) -> StatusCode {
    info!("user signed out");
    StatusCode::NO_CONTENT
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<SessionResponse>> {
    Ok(Json(
        services::bootstrap_session(state.store.as_ref(), user.id).await?,
    ))
}
