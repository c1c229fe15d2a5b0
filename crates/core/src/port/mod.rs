// Port Layer - Interfaces for external dependencies

pub mod converter;
pub mod executable_resolver;
pub mod locale;
pub mod process_executor;

// Re-exports
pub use converter::DocumentConverter;
pub use executable_resolver::ExecutableResolver;
pub use locale::LocaleControl;
pub use process_executor::{Invocation, ProcessExecutor};
