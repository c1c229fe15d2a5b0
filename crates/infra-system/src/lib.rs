// Docexec Infrastructure - System Adapters
// Implements: ProcessExecutor, ExecutableResolver, LocaleControl, DocumentConverter

pub mod factory;
pub mod libc_locale;
pub mod libreoffice;
pub mod path_resolver;
#[cfg(unix)]
mod streaming;
pub mod subprocess_executor;
pub mod validation;

pub use factory::converter_for;
pub use libc_locale::LibcLocale;
pub use libreoffice::LibreOfficeConverter;
pub use path_resolver::PathResolver;
pub use subprocess_executor::SubprocessExecutor;
