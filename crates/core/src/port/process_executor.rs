// Process Executor Port
// Abstraction for running a fully built command line as an external process

use crate::domain::{ExecutionOptions, ExecutionResult, InputSource};

/// One run request handed to an executor
#[derive(Debug)]
pub struct Invocation<'a> {
    pub command_line: &'a str,
    pub options: &'a ExecutionOptions,
    pub input: Option<&'a mut InputSource>,
}

/// Process Executor trait
///
/// Implementations:
/// - SubprocessExecutor: spawns a shell process with piped or simple strategy
///
/// Ordinary failures (non-zero exit, timeout, spawn failure) are reported in
/// the returned result, never as a panic or error.
pub trait ProcessExecutor: Send + Sync {
    fn execute(&self, invocation: Invocation<'_>) -> ExecutionResult;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::{ProcessOutcome, ProcessSpawnError};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit 0 with the given stdout
        Success(String),
        /// Exit with code and stderr
        Fail(i32, String),
        /// Process could not be created
        SpawnFail(String),
        /// Terminated by the timeout
        Timeout,
    }

    /// Mock Process Executor for testing
    pub struct MockProcessExecutor {
        behavior: Arc<Mutex<MockBehavior>>,
        command_lines: Arc<Mutex<Vec<String>>>,
        inputs: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl MockProcessExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                command_lines: Arc::new(Mutex::new(Vec::new())),
                inputs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success(stdout: impl Into<String>) -> Self {
            Self::new(MockBehavior::Success(stdout.into()))
        }

        pub fn new_fail(code: i32, stderr: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(code, stderr.into()))
        }

        pub fn call_count(&self) -> usize {
            self.command_lines.lock().unwrap().len()
        }

        pub fn command_lines(&self) -> Vec<String> {
            self.command_lines.lock().unwrap().clone()
        }

        /// Stdin payloads consumed per call
        pub fn inputs(&self) -> Vec<Vec<u8>> {
            self.inputs.lock().unwrap().clone()
        }
    }

    impl ProcessExecutor for MockProcessExecutor {
        fn execute(&self, invocation: Invocation<'_>) -> ExecutionResult {
            let line = invocation.command_line.to_string();
            self.command_lines.lock().unwrap().push(line.clone());

            let mut consumed = Vec::new();
            if let Some(input) = invocation.input {
                let _ = input.copy_all(&mut consumed);
            }
            self.inputs.lock().unwrap().push(consumed);

            let behavior = self.behavior.lock().unwrap().clone();
            let outcome = |stdout: &str, stderr: &str, exit_code: i32, timed_out: bool| {
                ProcessOutcome {
                    stdout: stdout.as_bytes().to_vec(),
                    stderr: stderr.as_bytes().to_vec(),
                    exit_code,
                    timed_out,
                    elapsed: Duration::from_millis(1),
                }
            };

            match behavior {
                MockBehavior::Success(stdout) => {
                    ExecutionResult::from_outcome(&line, outcome(&stdout, "", 0, false))
                }
                MockBehavior::Fail(code, stderr) => {
                    ExecutionResult::from_outcome(&line, outcome("", &stderr, code, false))
                }
                MockBehavior::SpawnFail(reason) => {
                    ExecutionResult::spawn_failed(ProcessSpawnError::new(line, reason))
                }
                MockBehavior::Timeout => ExecutionResult::from_outcome(
                    &line,
                    outcome("", "Command terminated by signal 15", 143, true),
                ),
            }
        }
    }
}
