// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Command error: {0}")]
    Command(#[from] crate::domain::CommandError),

    #[error("Spawn error: {0}")]
    Spawn(#[from] crate::domain::ProcessSpawnError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] crate::domain::ConversionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
