//! Error types for the ultraplan_core library.

use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ultraplan_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A date string that is not a valid `YYYY-MM-DD` calendar date
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The date lies outside every configured phase or week
    #[error("Date {0} is out of plan range")]
    OutOfRange(NaiveDate),

    /// Plan data failed its integrity checks
    #[error("Plan validation error: {0}")]
    PlanValidation(String),

    /// The activity service rejected the credentials (401/403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// No endpoint of the activity service could be reached
    #[error("Connection failed: {0}")]
    Network(String),

    /// The activity service answered with something we cannot use
    #[error("Activity source error: {0}")]
    Activity(String),

    /// Another sync holds the in-flight guard
    #[error("A sync is already in progress")]
    SyncInProgress,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures caused by rejected credentials rather than connectivity
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}
