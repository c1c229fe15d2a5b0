// Executable lookup
// reason: which handles PATH search, PATHEXT and the executable bit
use std::path::PathBuf;
use tracing::debug;

use docexec_core::domain::CommandError;
use docexec_core::port::ExecutableResolver;

/// Resolves programs the way a shell would, without spawning one
///
/// Absolute and relative paths are checked in place; bare names are looked up
/// on `PATH`.
#[derive(Debug, Default, Clone)]
pub struct PathResolver {
    search_path: Option<std::ffi::OsString>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search `paths` instead of the process' `PATH`
    pub fn with_search_path(paths: impl Into<std::ffi::OsString>) -> Self {
        Self {
            search_path: Some(paths.into()),
        }
    }
}

impl ExecutableResolver for PathResolver {
    fn resolve(&self, program: &str) -> Result<PathBuf, CommandError> {
        let name = program.trim().trim_matches('"');
        if name.is_empty() {
            return Err(CommandError::NoExecutable);
        }

        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_default();
                which::which_in(name, Some(paths), cwd)
            }
            None => which::which(name),
        };

        found.map_err(|e| {
            debug!(program = %name, error = %e, "Executable lookup failed");
            CommandError::ExecutableNotFound(program.to_string())
        })
    }
}
