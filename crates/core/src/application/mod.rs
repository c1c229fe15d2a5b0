// Application Layer - Escaping, command line assembly and use cases

pub mod command_line;
pub mod constants;
pub mod conversion;
pub mod escaper;
pub mod runner;

// Re-exports
pub use command_line::CommandLineBuilder;
pub use conversion::ConversionService;
pub use escaper::{ArgumentEscaper, LocaleGuard, ShellDialect};
pub use runner::CommandRunner;
