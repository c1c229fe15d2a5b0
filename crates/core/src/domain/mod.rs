// Domain Layer - Command, argument and result models

pub mod argument;
pub mod command;
pub mod conversion;
pub mod error;
pub mod escaping;
pub mod input;
pub mod options;
pub mod result;

// Re-exports
pub use argument::{ArgValue, Argument, JOIN_MARKER};
pub use command::Command;
pub use conversion::{ConversionPlan, ConversionRequest, ConverterConfig, ConverterKind};
pub use error::{CommandError, ConversionError, ProcessSpawnError};
pub use escaping::{ArgumentRenderer, ShellDialect};
pub use input::InputSource;
pub use options::{ExecutionOptions, Strategy, StreamingSupport};
pub use result::{ExecutionResult, ExecutionState, ProcessOutcome};
