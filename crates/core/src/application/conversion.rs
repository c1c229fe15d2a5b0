// Document conversion use case
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{
    Command, ConversionError, ConversionRequest, ExecutionOptions, ExecutionResult,
};
use crate::port::DocumentConverter;

use super::escaper::ArgumentEscaper;
use super::runner::CommandRunner;

/// Runs a [`DocumentConverter`] through the process engine
///
/// The engine itself is synchronous; it is moved onto tokio's blocking pool so
/// async callers are not stalled while the converter runs.
pub struct ConversionService {
    converter: Arc<dyn DocumentConverter>,
    runner: CommandRunner,
    escaper: ArgumentEscaper,
    options: ExecutionOptions,
}

impl ConversionService {
    pub fn new(converter: Arc<dyn DocumentConverter>, runner: CommandRunner) -> Self {
        Self {
            converter,
            runner,
            escaper: ArgumentEscaper::default(),
            options: ExecutionOptions::default(),
        }
    }

    pub fn with_escaper(mut self, escaper: ArgumentEscaper) -> Self {
        self.escaper = escaper;
        self
    }

    /// Options applied to every conversion command (timeout, environment...)
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Convert one document, returning the final output path
    ///
    /// # Errors
    /// - Validation errors from the converter before any process is spawned
    /// - ConversionError::Command for pre-flight command errors
    /// - ConversionError::Failed with the engine's error text and exit code
    pub async fn convert(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
        let plan = self.converter.prepare(request)?;

        let mut options = self.options.clone();
        if plan.working_dir.is_some() {
            options.working_dir = plan.working_dir.clone();
        }
        let mut command = Command::new(plan.program.to_string_lossy())
            .with_escaper(self.escaper.clone())
            .with_options(options);
        command.add_args(plan.arguments.iter().cloned())?;

        info!(
            converter = %self.converter.kind(),
            input = %request.input.display(),
            output = %request.output.display(),
            "Starting document conversion"
        );

        let runner = self.runner.clone();
        let result: ExecutionResult = tokio::task::spawn_blocking(move || {
            runner.execute(&mut command).map(|result| result.clone())
        })
        .await
        .map_err(|e| ConversionError::Join(e.to_string()))??;

        if !result.succeeded() {
            error!(
                converter = %self.converter.kind(),
                exit_code = ?result.exit_code(),
                error = %result.error(),
                "Document conversion failed"
            );
            return Err(ConversionError::Failed {
                message: result.error().to_string(),
                exit_code: result.exit_code(),
            });
        }

        info!(output = %result.stdout(), "Converter finished");
        self.converter.finalize(request, &plan).await
    }
}
