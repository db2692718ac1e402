//! Error types shared by the pantry, memory and agent layers.

use thiserror::Error;

/// Top-level error type for the pantry agent.
#[derive(Debug, Error)]
pub enum HomeError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Caller supplied input that can never succeed (bad key type, negative amount).
    #[error("validation error: {0}")]
    Validation(String),
    /// `SQLite` storage error (sync).
    #[error("storage unavailable: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("storage unavailable: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// Stored blob could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// HTTP client error from Rig.
    #[error("agent unavailable: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// Completion error from the language model.
    #[error("agent unavailable: {0}")]
    Completion(#[from] rig::completion::CompletionError),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl HomeError {
    /// Whether the error comes from the backing store.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Sqlite(_) | Self::TokioSqlite(_))
    }

    /// Whether the error comes from the language model capability.
    #[must_use]
    pub const fn is_agent(&self) -> bool {
        matches!(self, Self::HttpClient(_) | Self::Completion(_))
    }
}

/// Convenience result alias.
pub type HomeResult<T> = Result<T, HomeError>;
