// Execution options for a single command run

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Whether the host can put pipe ends into non-blocking mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingSupport {
    Available,
    Unavailable,
}

impl StreamingSupport {
    /// Streaming support of the platform this crate was compiled for
    pub fn host() -> Self {
        if cfg!(unix) {
            StreamingSupport::Available
        } else {
            StreamingSupport::Unavailable
        }
    }
}

/// Execution strategy actually used for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Run-and-capture-all compatibility fallback (no timeout, no stderr split)
    Simple,
    /// Piped streams drained by a polling loop on non-blocking pipes
    PipedNonBlocking,
    /// Piped streams with blocking writes and reads
    PipedBlocking,
}

#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Use the simple run-and-capture strategy instead of pipes
    pub use_blocking_exec: bool,
    /// Merge stderr into stdout in the simple strategy
    pub capture_stderr: bool,
    pub working_dir: Option<PathBuf>,
    /// Replaces the child environment when set
    pub environment: Option<HashMap<String, String>>,
    /// Parent variables copied into an overridden environment
    pub env_passthrough: Vec<String>,
    pub timeout: Option<Duration>,
    /// `None` = enabled wherever streaming is available
    pub non_blocking_mode: Option<bool>,
    /// Escalate to a forced kill if the process outlives the graceful
    /// termination by this much. Off by default.
    pub force_kill_after: Option<Duration>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            use_blocking_exec: false,
            capture_stderr: true,
            working_dir: None,
            environment: None,
            env_passthrough: Vec::new(),
            timeout: None,
            non_blocking_mode: None,
            force_kill_after: None,
        }
    }
}

impl ExecutionOptions {
    /// Set a timeout in whole seconds; zero disables the timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    /// Pick the strategy for the given platform capability
    pub fn strategy(&self, support: StreamingSupport) -> Strategy {
        if self.use_blocking_exec {
            return Strategy::Simple;
        }
        let wants_non_blocking = self
            .non_blocking_mode
            .unwrap_or(support == StreamingSupport::Available);
        if wants_non_blocking && support == StreamingSupport::Available {
            Strategy::PipedNonBlocking
        } else {
            Strategy::PipedBlocking
        }
    }
}
