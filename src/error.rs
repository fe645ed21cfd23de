use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the ledger and the experiment runner
#[derive(Error, Debug)]
pub enum ScorebookError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Improvement rates are relative to a reference score, which must be non-zero.
    #[error("Cannot compute improvement rate: {label} score is zero")]
    ZeroReference { label: String },

    // Runner input errors
    #[error("Input data file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Training failed: {0}")]
    Training(String),
}

/// Result type alias for ScorebookError
pub type Result<T> = std::result::Result<T, ScorebookError>;
