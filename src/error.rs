//! Error types shared by every feature module.
//!
//! `StoreError` classifies storage failures by SQLSTATE so callers never match
//! on message text. `AppError` is the taxonomy surfaced to API consumers; each
//! variant maps to one status code and a stable machine-readable `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::error::DatabaseError;
use thiserror::Error;

/// Body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDto {
    /// Stable identifier the dashboard switches on.
    pub code: String,
    /// Human readable message.
    pub error: String,
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Row-level security or grant rejected the statement (SQLSTATE 42501).
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// An expected column is absent from the live schema (SQLSTATE 42703).
    #[error("undefined column: {0}")]
    UndefinedColumn(String),
    #[error("duplicate record: {0}")]
    UniqueViolation(String),
    #[error("referenced record does not exist: {0}")]
    ForeignKeyViolation(String),
    #[error("record not found")]
    NotFound,
    /// Network or pool level failure; the database could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) => {
                let described = describe_db_error(&**db);
                match db.code().as_deref() {
                    Some("42501") => Self::PermissionDenied(described),
                    Some("42703") => Self::UndefinedColumn(described),
                    Some("23505") => Self::UniqueViolation(described),
                    Some("23503") => Self::ForeignKeyViolation(described),
                    _ => Self::Database(described),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::Unavailable(e.to_string()),
            _ => Self::Database(e.to_string()),
        }
    }
}

/// Joins the message with Postgres detail and hint when present.
fn describe_db_error(db: &dyn DatabaseError) -> String {
    let mut parts = vec![db.message().to_string()];
    if let Some(pg) = db.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg.detail() {
            parts.push(format!("({detail})"));
        }
        if let Some(hint) = pg.hint() {
            parts.push(format!("Hint: {hint}"));
        }
    }
    parts.join(" ")
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    IncompleteForm(String),
    #[error("No active academic year found. Create or activate one first.")]
    NoActiveYear,
    #[error("{0}")]
    Unauthorized(String),
    /// The session cannot continue (for example the profile could not be
    /// provisioned); the client must discard its tokens.
    #[error("{0}")]
    SessionTerminated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            Self::IncompleteForm(msg) => (StatusCode::BAD_REQUEST, "incomplete_form", msg.clone()),
            Self::NoActiveYear => (StatusCode::BAD_REQUEST, "no_active_year", self.to_string()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            Self::SessionTerminated(msg) => (StatusCode::UNAUTHORIZED, "signed_out", msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            Self::Store(StoreError::PermissionDenied(_)) => (
                StatusCode::FORBIDDEN,
                "permission_denied",
                "Permission denied: the database rejected this operation. \
                 Fix the row-level security configuration."
                    .to_string(),
            ),
            Self::Store(StoreError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "connection_failed",
                "Connection failed: the school database is unreachable. Retry shortly."
                    .to_string(),
            ),
            Self::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "not_found", "Record not found".to_string())
            }
            Self::Store(StoreError::UniqueViolation(msg)) => {
                (StatusCode::CONFLICT, "conflict", format!("Database error: {msg}"))
            }
            Self::Store(StoreError::ForeignKeyViolation(msg)) => {
                (StatusCode::BAD_REQUEST, "validation", format!("Database error: {msg}"))
            }
            Self::Store(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                format!("Database error: {err}"),
            ),
            Self::Unexpected(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected",
                format!("Unexpected error: {err}"),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = self.parts();
        if status.is_server_error() {
            tracing::error!(%status, code, error = %self, "request failed");
        } else {
            tracing::debug!(%status, code, error = %self, "request rejected");
        }
        (
            status,
            Json(ErrorDto {
                code: code.to_string(),
                error,
            }),
        )
            .into_response()
    }
}
