use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AdmissionResponse, AdmitRequest, FormData},
    services,
};
use crate::{
    auth::{AuthUser, Role},
    error::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admissions/form-data", get(form_data))
        .route("/admissions", post(admit))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn form_data(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<FormData>> {
    user.require(&[Role::Admin])?;
    Ok(Json(
        services::form_data(state.store.as_ref(), &state.club_columns).await?,
    ))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn admit(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AdmitRequest>,
) -> AppResult<(StatusCode, Json<AdmissionResponse>)> {
    user.require(&[Role::Admin])?;
    let admitted = services::admit(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(admitted)))
}
