//! Typed error hierarchy for the launcher.
//!
//! - `StoreError` — storage adapter failures (any backend)
//! - `ClientError` — HTTP client failures talking to a launcher server

use thiserror::Error;

/// Errors from an `EntryStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Blocking store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors from `LauncherClient`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Server returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            ClientError::InvalidUrl(_) => None,
        }
    }
}
