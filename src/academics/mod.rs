use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod selection;
pub mod services;

pub use repo::AcademicsRepo;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::calendar_routes())
        .merge(handlers::reference_routes())
}
