// errors.rs
use thiserror::Error;

/// Errors originating from either caller misuse (unknown tracked fields,
/// bad settings) or downstream layers (DB, files).
///
/// Dirty scraped data is never an error: every lookup in scoring and diffing
/// has an "unknown" fallback instead.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Database Error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// A tracked-field name that no `DogRecord` carries.
    #[error("Unknown tracked field: {0}")]
    UnknownField(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Not Found: {0}")]
    NotFound(String),
}

// Type alias used across the store and pipeline.
pub type Result<T> = std::result::Result<T, TrackerError>;
