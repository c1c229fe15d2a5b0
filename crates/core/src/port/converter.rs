// Document Converter Port
// A converter validates its paths and names the program + arguments; the
// engine runs them. Variants are a closed set (ConverterKind).

use crate::domain::{ConversionError, ConversionPlan, ConversionRequest, ConverterKind};
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait DocumentConverter: Send + Sync {
    fn kind(&self) -> ConverterKind;

    /// Validate the request and produce the invocation to run
    ///
    /// # Errors
    /// - ConversionError::Validation / InputNotReadable / ProfileNotWritable
    ///   before any process is spawned
    fn prepare(&self, request: &ConversionRequest) -> Result<ConversionPlan, ConversionError>;

    /// Place the produced file at the requested output path
    ///
    /// # Errors
    /// - ConversionError::MissingOutput if the converter wrote nothing
    async fn finalize(
        &self,
        request: &ConversionRequest,
        plan: &ConversionPlan,
    ) -> Result<PathBuf, ConversionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::Argument;
    use std::sync::Mutex;

    /// Converter that plans `program <input>` and accepts any output
    pub struct MockConverter {
        program: String,
        reject_with: Option<String>,
        finalized: Mutex<Vec<PathBuf>>,
    }

    impl MockConverter {
        pub fn new(program: impl Into<String>) -> Self {
            Self {
                program: program.into(),
                reject_with: None,
                finalized: Mutex::new(Vec::new()),
            }
        }

        pub fn rejecting(message: impl Into<String>) -> Self {
            Self {
                reject_with: Some(message.into()),
                ..Self::new("mock-converter")
            }
        }

        pub fn finalized(&self) -> Vec<PathBuf> {
            self.finalized.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentConverter for MockConverter {
        fn kind(&self) -> ConverterKind {
            ConverterKind::LibreOffice
        }

        fn prepare(&self, request: &ConversionRequest) -> Result<ConversionPlan, ConversionError> {
            if let Some(message) = &self.reject_with {
                return Err(ConversionError::Validation(message.clone()));
            }
            Ok(ConversionPlan {
                program: PathBuf::from(&self.program),
                arguments: vec![Argument::positional(request.input.to_string_lossy())],
                produced: request.output.clone(),
                working_dir: None,
            })
        }

        async fn finalize(
            &self,
            request: &ConversionRequest,
            _plan: &ConversionPlan,
        ) -> Result<PathBuf, ConversionError> {
            self.finalized.lock().unwrap().push(request.output.clone());
            Ok(request.output.clone())
        }
    }
}
