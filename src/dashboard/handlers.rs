use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::instrument;

use super::services::{self, DashboardView};
use crate::{auth::AuthUser, error::AppResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[instrument(skip(state), fields(user_id = %user.id, role = %user.role))]
pub async fn dashboard(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<DashboardView>> {
    let today = OffsetDateTime::now_utc().date();
    Ok(Json(
        services::dashboard(state.store.as_ref(), user.role, today).await?,
    ))
}
