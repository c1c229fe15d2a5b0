// Execution result of a single command run

use serde::Serialize;
use std::time::Duration;

use super::error::ProcessSpawnError;

/// Final state reached by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    #[default]
    NotStarted,
    Completed,
    TimedOut,
    SpawnFailed,
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionState::NotStarted => write!(f, "NOT_STARTED"),
            ExecutionState::Completed => write!(f, "COMPLETED"),
            ExecutionState::TimedOut => write!(f, "TIMED_OUT"),
            ExecutionState::SpawnFailed => write!(f, "SPAWN_FAILED"),
        }
    }
}

/// What an executor observed for a process that was spawned and collected
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit status, `128 + N` when killed by signal N
    pub exit_code: i32,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Captured output and exit information of a command
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionResult {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    error: String,
    executed: bool,
    state: ExecutionState,
    timed_out: bool,
    duration_ms: u64,
    spawn_error: Option<ProcessSpawnError>,
}

impl ExecutionResult {
    /// Classify a piped run: stderr is reported verbatim, with a synthesized
    /// message only when the process was silent.
    pub fn from_outcome(command_line: &str, outcome: ProcessOutcome) -> Self {
        let stdout = String::from_utf8_lossy(&outcome.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&outcome.stderr).into_owned();
        let code = outcome.exit_code;

        let error = if code == 0 && !outcome.timed_out {
            String::new()
        } else if !stderr.trim().is_empty() {
            stderr.clone()
        } else if code == 0 {
            format!("Command timed out and was terminated: {}", command_line)
        } else {
            format!(
                "Failed without error message: {} (Exit code: {})",
                command_line, code
            )
        };

        Self {
            stdout,
            stderr,
            exit_code: Some(code),
            error,
            executed: true,
            state: if outcome.timed_out {
                ExecutionState::TimedOut
            } else {
                ExecutionState::Completed
            },
            timed_out: outcome.timed_out,
            duration_ms: outcome.elapsed.as_millis() as u64,
            spawn_error: None,
        }
    }

    /// Classify a simple-strategy run where stderr may be merged into stdout
    pub fn from_merged_output(output: Vec<u8>, exit_code: i32, elapsed: Duration) -> Self {
        let stdout = String::from_utf8_lossy(&output).into_owned();
        let (stderr, error) = if exit_code == 0 {
            (String::new(), String::new())
        } else if stdout.trim().is_empty() {
            (stdout.clone(), "Command failed".to_string())
        } else {
            (stdout.clone(), stdout.clone())
        };

        Self {
            stdout,
            stderr,
            exit_code: Some(exit_code),
            error,
            executed: true,
            state: ExecutionState::Completed,
            timed_out: false,
            duration_ms: elapsed.as_millis() as u64,
            spawn_error: None,
        }
    }

    /// No process handle could be obtained
    pub fn spawn_failed(err: ProcessSpawnError) -> Self {
        Self {
            error: err.to_string(),
            state: ExecutionState::SpawnFailed,
            spawn_error: Some(err),
            ..Default::default()
        }
    }

    /// Trimmed stdout
    pub fn stdout(&self) -> &str {
        self.stdout.trim()
    }

    pub fn raw_stdout(&self) -> &str {
        &self.stdout
    }

    /// Trimmed stderr
    pub fn stderr(&self) -> &str {
        self.stderr.trim()
    }

    pub fn raw_stderr(&self) -> &str {
        &self.stderr
    }

    /// Trimmed error message, empty on success
    pub fn error(&self) -> &str {
        self.error.trim()
    }

    pub fn raw_error(&self) -> &str {
        &self.error
    }

    /// `None` until a run has collected an exit status
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// The process was spawned and its exit status collected
    pub fn executed(&self) -> bool {
        self.executed
    }

    /// Exit code 0 without being stopped by the timeout
    pub fn succeeded(&self) -> bool {
        self.executed && self.exit_code == Some(0) && !self.timed_out
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn spawn_error(&self) -> Option<&ProcessSpawnError> {
        self.spawn_error.as_ref()
    }
}
