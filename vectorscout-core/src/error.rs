//! Error types for vectorscout-core

use thiserror::Error;

/// Main error type for the vectorscout-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Payload could not be decoded at all
    #[error("decode error: {0}")]
    Decode(String),

    /// Record violates a construction invariant
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Diagram definition error
    #[error("diagram error in {diagram}: {message}")]
    Diagram { diagram: String, message: String },

    /// Schedule provider / HTTP error
    #[error("schedule error: {0}")]
    Schedule(String),

    /// Schedule not available for an event
    #[error("schedule not available for event: {0}")]
    ScheduleUnavailable(String),

    /// Stored record not found
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Result type alias for vectorscout-core
pub type Result<T> = std::result::Result<T, Error>;
