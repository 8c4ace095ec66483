//! Error types for gorge-import
//!
//! Expected transfer failures (timeouts, refused connections, non-2xx
//! responses) are not errors in this crate: they are recorded on the update
//! record and reported as values. The types here cover everything else:
//! persistence failures, invalid input, and the unexpected conditions that
//! make a download attempt fatal.

use crate::types::UpdateId;
use crate::update::UpdateState;
use thiserror::Error;

/// Result type alias for gorge-import operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gorge-import
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "storage_dir")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Update record lifecycle violation
    #[error("update error: {0}")]
    Update(#[from] UpdateError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error outside of transfer classification (e.g. client construction)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Data source URL could not be parsed
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Parser error
        reason: String,
    },

    /// Referenced record does not exist
    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Short name of the error kind, used in fatal download diagnostics.
    ///
    /// I/O errors report their [`std::io::ErrorKind`] (e.g. `StorageFull`) since
    /// that is the detail an operator needs when a sink write fails.
    pub fn kind(&self) -> String {
        match self {
            Error::Io(e) => format!("{:?}", e.kind()),
            Error::Config { .. } => "ConfigError".to_string(),
            Error::Database(_) | Error::Sqlx(_) => "DatabaseError".to_string(),
            Error::Update(_) => "UpdateError".to_string(),
            Error::Network(_) => "NetworkError".to_string(),
            Error::InvalidUrl { .. } => "InvalidUrl".to_string(),
            Error::NotFound(_) => "NotFound".to_string(),
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Update record lifecycle errors
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Transition not permitted from the record's current state
    #[error("cannot {operation} update {id} in state {from}")]
    InvalidTransition {
        /// The update whose transition was rejected
        id: UpdateId,
        /// State the record was in
        from: UpdateState,
        /// The transition that was attempted (e.g. "start download")
        operation: &'static str,
    },

    /// Success fields are write-once
    #[error("update {id} already has a downloaded file")]
    AlreadyDownloaded {
        /// The update that already carries `file_path`/`download_time`
        id: UpdateId,
    },
}
