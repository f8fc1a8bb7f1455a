//! Error types for the content pipeline.

use thiserror::Error;

/// Result type alias using the tidecast error type.
pub type Result<T> = std::result::Result<T, TidecastError>;

/// Main error type for the content pipeline.
///
/// Generation failures are not represented here: they are domain data
/// (`GenerationFailure`) consumed by the orchestrator's fallback branch.
/// Delivery failures are likewise data (`DeliveryOutcome`), never errors.
#[derive(Error, Debug)]
pub enum TidecastError {
    /// A content request violated its input constraints
    #[error("Invalid content request: {0}")]
    Validation(String),

    /// Configuration could not be resolved (bad env value, missing credential)
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client error
    #[error("HTTP request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// History storage error
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// History schema migration error
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Filesystem error (letter output, JSONL history, report artifact)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
