// Domain Error Types

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Pre-flight errors raised before any process is spawned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Could not locate any executable command")]
    NoExecutable,

    #[error("The '{0}' command was not found on server or is not executable by the current user")]
    ExecutableNotFound(String),

    #[error("Locale '{0}' is not available")]
    InvalidLocale(String),
}

/// The OS refused or failed to create the process
///
/// Carried inside the [`ExecutionResult`](crate::domain::ExecutionResult)
/// rather than returned as `Err`, so callers always get a result object.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Could not run command {command_line}: {reason}")]
pub struct ProcessSpawnError {
    pub command_line: String,
    pub reason: String,
}

impl ProcessSpawnError {
    pub fn new(command_line: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            command_line: command_line.into(),
            reason: reason.to_string(),
        }
    }
}

/// Document conversion errors
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Input file '{0}' is not readable")]
    InputNotReadable(PathBuf),

    #[error("'{program}' does not have permissions to the user profile directory ('{profile}')")]
    ProfileNotWritable { program: String, profile: PathBuf },

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Conversion failed [{}]: {message}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "n/a".to_string()))]
    Failed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("Converter produced no output at '{0}'")]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion task aborted: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, CommandError>;
