use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{DraftRequest, DraftResponse, SuggestionRequest, SuggestionResponse},
    services,
};
use crate::{
    auth::{AuthUser, Role},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assistant/draft", post(draft))
        .route("/assistant/house-point-suggestions", post(house_point_suggestions))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn draft(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DraftRequest>,
) -> AppResult<Json<DraftResponse>> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden("The assistant is available to staff only".into()));
    }
    Ok(Json(services::draft(state.assistant.as_ref(), payload).await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn house_point_suggestions(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SuggestionRequest>,
) -> AppResult<Json<SuggestionResponse>> {
    user.require(&[Role::Admin])?;
    Ok(Json(
        services::house_point_suggestions(state.assistant.as_ref(), &payload.house_name).await?,
    ))
}
