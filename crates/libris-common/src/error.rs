//! Error types for Libris

use thiserror::Error;

/// Result type alias for Libris operations
pub type Result<T> = std::result::Result<T, LibrisError>;

/// Main error type for Libris
#[derive(Error, Debug)]
pub enum LibrisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Log rotation error: {0}")]
    Rotation(#[from] crate::rotation::RotationError),

    #[error("Configuration error: {0}")]
    Config(String),

}
