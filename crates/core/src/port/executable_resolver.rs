// Executable Resolver Port
// Pre-flight check that a program exists and is executable, without a shell.

use crate::domain::CommandError;
use std::path::PathBuf;

pub trait ExecutableResolver: Send + Sync {
    /// Resolve `program` to an executable path
    ///
    /// # Errors
    /// - CommandError::ExecutableNotFound if the program is missing or not
    ///   executable by the current user
    fn resolve(&self, program: &str) -> Result<PathBuf, CommandError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Resolver that accepts a fixed set of program names
    pub struct MockResolver {
        known: Vec<String>,
        lookups: Mutex<Vec<String>>,
    }

    impl MockResolver {
        pub fn new(known: &[&str]) -> Self {
            Self {
                known: known.iter().map(|s| s.to_string()).collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }

        /// Accept every program as-is
        pub fn permissive() -> Self {
            Self::new(&[])
        }

        pub fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    impl ExecutableResolver for MockResolver {
        fn resolve(&self, program: &str) -> Result<PathBuf, CommandError> {
            self.lookups.lock().unwrap().push(program.to_string());
            if self.known.is_empty() || self.known.iter().any(|k| k == program) {
                Ok(PathBuf::from(program))
            } else {
                Err(CommandError::ExecutableNotFound(program.to_string()))
            }
        }
    }
}
