use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateEventRequest, EventQuery, FeedQuery},
    repo_types::SchoolEvent,
    services,
};
use crate::{
    auth::{AuthUser, Role},
    error::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/feed", get(feed))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_events(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<EventQuery>,
) -> AppResult<Json<Vec<SchoolEvent>>> {
    user.require(&[Role::Admin, Role::Editor])?;
    Ok(Json(state.store.list_events(q.audience).await?))
}

#[instrument(skip(state), fields(user_id = %user.id, role = %user.role))]
pub async fn feed(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<FeedQuery>,
) -> AppResult<Json<Vec<SchoolEvent>>> {
    Ok(Json(
        services::feed(state.store.as_ref(), user.role, q.from, q.limit).await?,
    ))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<SchoolEvent>)> {
    user.require(&[Role::Admin, Role::Editor])?;
    let event = services::create_event(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}
