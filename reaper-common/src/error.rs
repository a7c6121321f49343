//! Error types for index retention runs

use thiserror::Error;

/// Errors raised while configuring or running a retention pass
#[derive(Error, Debug)]
pub enum ReaperError {
    #[error("Retention period cannot be less than {min} days (got {days})")]
    RetentionTooShort { days: i64, min: i64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Listing the cluster's indices failed; nothing can be acted on
    #[error("Failed to retrieve indices: {0}")]
    Retrieval(#[source] Box<ReaperError>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("received status code {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed")]
    AuthFailed,
}

pub type Result<T> = std::result::Result<T, ReaperError>;
