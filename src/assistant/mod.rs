//! Text drafting backed by a generative-text API.

use async_trait::async_trait;
use axum::Router;
use thiserror::Error;

use crate::state::AppState;

pub mod client;
pub mod dto;
pub mod handlers;
pub mod services;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant is not configured")]
    Disabled,
    #[error("request to text backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("text backend returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Single attempt. `json_array` asks the backend for a JSON array body.
    /// `Ok(None)` means the backend answered without any text.
    async fn generate(&self, prompt: &str, json_array: bool) -> Result<Option<String>, AssistantError>;
}

pub fn router() -> Router<AppState> {
    handlers::routes()
}
