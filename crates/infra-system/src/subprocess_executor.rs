// Subprocess executor implementation
// reason: std::process for spawning, nix (unix) for status polling and signals
use std::collections::HashMap;
use std::io;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use docexec_core::application::constants::{SIGNAL_EXIT_BASE, UNKNOWN_EXIT_CODE};
use docexec_core::domain::{
    ExecutionOptions, ExecutionResult, InputSource, ProcessOutcome, ProcessSpawnError,
    ShellDialect, Strategy, StreamingSupport,
};
use docexec_core::port::{Invocation, ProcessExecutor};

#[cfg(unix)]
const SHELL: &str = "sh";
#[cfg(unix)]
const SHELL_ARGS: &[&str] = &["-c"];

#[cfg(windows)]
const SHELL: &str = "cmd";
#[cfg(windows)]
const SHELL_ARGS: &[&str] = &["/C"];

/// Subprocess executor
///
/// Runs command lines through the platform shell using one of three
/// strategies (see [`Strategy`]).
pub struct SubprocessExecutor {
    streaming: StreamingSupport,
}

impl SubprocessExecutor {
    /// Create an executor for the current platform
    ///
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new();
    /// let runner = CommandRunner::new(Arc::new(PathResolver::new()), Arc::new(executor));
    /// ```
    pub fn new() -> Self {
        Self {
            streaming: StreamingSupport::host(),
        }
    }

    /// Pretend the platform has (or lacks) non-blocking pipes
    pub fn with_streaming_support(streaming: StreamingSupport) -> Self {
        if streaming == StreamingSupport::Available && StreamingSupport::host() != streaming {
            warn!("Non-blocking pipes are not available on this platform, falling back");
            return Self::new();
        }
        Self { streaming }
    }

    pub fn streaming_support(&self) -> StreamingSupport {
        self.streaming
    }

    /// Copy allowlisted variables from the parent environment
    fn filter_env(&self, allowlist: &[String]) -> HashMap<String, String> {
        allowlist
            .iter()
            .filter_map(|k| std::env::var(k).ok().map(|v| (k.clone(), v)))
            .collect()
    }

    /// Shell process for `command_line` with cwd, environment and process group applied
    pub(crate) fn shell_command(&self, command_line: &str, options: &ExecutionOptions) -> Command {
        let mut cmd = Command::new(SHELL);
        cmd.args(SHELL_ARGS);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.raw_arg(command_line);
        }
        #[cfg(not(windows))]
        cmd.arg(command_line);

        if let Some(dir) = &options.working_dir {
            cmd.current_dir(dir);
        }

        if let Some(env) = &options.environment {
            let inherited = self.filter_env(&options.env_passthrough);
            cmd.env_clear().envs(&inherited).envs(env);
        }

        // Own process group so the timeout can signal the shell and its children together
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd
    }

    /// Strategy A: run and capture everything, optionally merging stderr
    fn execute_simple(&self, invocation: Invocation<'_>) -> ExecutionResult {
        let options = invocation.options;
        let line = if options.capture_stderr {
            merge_stderr(invocation.command_line, ShellDialect::host())
        } else {
            invocation.command_line.to_string()
        };

        if options.timeout.is_some() {
            debug!("Timeout is not enforced by the simple execution strategy");
        }

        let mut cmd = self.shell_command(&line, options);
        cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
        cmd.stdin(if invocation.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let start = Instant::now();
        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecutionResult::spawn_failed(ProcessSpawnError::new(
                    invocation.command_line,
                    e,
                ))
            }
        };

        match feed_and_collect(child, invocation.input) {
            Ok(output) => ExecutionResult::from_merged_output(
                output.stdout,
                exit_code_of(output.status),
                start.elapsed(),
            ),
            Err(e) => ExecutionResult::spawn_failed(ProcessSpawnError::new(
                invocation.command_line,
                format!("failed to collect process status: {}", e),
            )),
        }
    }

    /// Strategy B without non-blocking pipes: write all input, then read
    /// both outputs to EOF and wait. No timeout enforcement.
    fn execute_piped_blocking(&self, invocation: Invocation<'_>) -> ExecutionResult {
        let options = invocation.options;
        if options.timeout.is_some() {
            warn!("Timeout cannot be enforced without non-blocking pipes");
        }

        let mut cmd = self.shell_command(invocation.command_line, options);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if invocation.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let start = Instant::now();
        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecutionResult::spawn_failed(ProcessSpawnError::new(
                    invocation.command_line,
                    e,
                ))
            }
        };

        match feed_and_collect(child, invocation.input) {
            Ok(output) => ExecutionResult::from_outcome(
                invocation.command_line,
                ProcessOutcome {
                    stdout: output.stdout,
                    stderr: output.stderr,
                    exit_code: exit_code_of(output.status),
                    timed_out: false,
                    elapsed: start.elapsed(),
                },
            ),
            Err(e) => ExecutionResult::spawn_failed(ProcessSpawnError::new(
                invocation.command_line,
                format!("failed to collect process status: {}", e),
            )),
        }
    }
}

impl Default for SubprocessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessExecutor for SubprocessExecutor {
    fn execute(&self, invocation: Invocation<'_>) -> ExecutionResult {
        let strategy = invocation.options.strategy(self.streaming);
        if invocation.options.non_blocking_mode == Some(true)
            && self.streaming == StreamingSupport::Unavailable
        {
            warn!("Non-blocking mode requested but unsupported, using blocking pipes");
        }
        info!(
            command = %invocation.command_line,
            strategy = ?strategy,
            "Spawning subprocess"
        );

        match strategy {
            Strategy::Simple => self.execute_simple(invocation),
            Strategy::PipedBlocking => self.execute_piped_blocking(invocation),
            #[cfg(unix)]
            Strategy::PipedNonBlocking => {
                let cmd = self.shell_command(invocation.command_line, invocation.options);
                crate::streaming::run_streaming(cmd, invocation)
            }
            #[cfg(not(unix))]
            Strategy::PipedNonBlocking => self.execute_piped_blocking(invocation),
        }
    }
}

/// Write all input, then collect both outputs and the exit status
///
/// The writer runs on a scoped thread so a child that fills its output pipe
/// before draining stdin cannot deadlock the run.
fn feed_and_collect(mut child: Child, input: Option<&mut InputSource>) -> io::Result<Output> {
    let stdin = child.stdin.take();
    thread::scope(|scope| {
        if let (Some(input), Some(mut stdin)) = (input, stdin) {
            scope.spawn(move || {
                if let Err(e) = input.copy_all(&mut stdin) {
                    debug!(error = %e, "Process closed stdin before all input was written");
                }
                // stdin dropped here: the child sees EOF
            });
        }
        child.wait_with_output()
    })
}

/// Redirect stderr of the whole script (fragments included) into stdout
fn merge_stderr(command_line: &str, dialect: ShellDialect) -> String {
    match dialect {
        // cmd binds a trailing redirect to the last `&&` segment only
        ShellDialect::Windows => format!("({}) 2>&1", command_line),
        ShellDialect::Posix => format!("exec 2>&1; {}", command_line),
    }
}

/// Exit code of a collected status, `128 + N` for signal N
pub(crate) fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_BASE + signal;
        }
    }
    UNKNOWN_EXIT_CODE
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use docexec_core::domain::ExecutionState;
    use std::time::Duration;

    fn run(executor: &SubprocessExecutor, line: &str, options: &ExecutionOptions) -> ExecutionResult {
        executor.execute(Invocation {
            command_line: line,
            options,
            input: None,
        })
    }

    fn blocking_options() -> ExecutionOptions {
        ExecutionOptions {
            non_blocking_mode: Some(false),
            ..Default::default()
        }
    }

    #[test]
    fn test_execute_success() {
        let executor = SubprocessExecutor::new();
        let result = run(&executor, "echo hello", &ExecutionOptions::default());

        assert!(result.succeeded());
        assert_eq!(result.stdout(), "hello");
    }

    #[test]
    fn test_simple_strategy_merges_stderr() {
        let executor = SubprocessExecutor::new();
        let options = ExecutionOptions {
            use_blocking_exec: true,
            ..Default::default()
        };
        let result = run(&executor, "echo out; echo err >&2; exit 4", &options);

        assert!(result.executed());
        assert_eq!(result.exit_code(), Some(4));
        assert!(result.stdout().contains("out"));
        assert!(result.error().contains("err"));
        assert_eq!(result.stderr(), result.stdout());
    }

    #[test]
    fn test_merge_covers_every_fragment() {
        let line = "pre && tool --x && post";

        assert_eq!(
            merge_stderr(line, ShellDialect::Windows),
            "(pre && tool --x && post) 2>&1"
        );
        assert_eq!(
            merge_stderr(line, ShellDialect::Posix),
            "exec 2>&1; pre && tool --x && post"
        );
    }

    #[test]
    fn test_simple_strategy_silent_failure() {
        let executor = SubprocessExecutor::new();
        let options = ExecutionOptions {
            use_blocking_exec: true,
            ..Default::default()
        };
        let result = run(&executor, "exit 2", &options);

        assert_eq!(result.exit_code(), Some(2));
        assert_eq!(result.error(), "Command failed");
    }

    #[test]
    fn test_piped_blocking_separates_streams() {
        let executor = SubprocessExecutor::new();
        let result = run(&executor, "echo out; echo err >&2; exit 3", &blocking_options());

        assert_eq!(result.stdout(), "out");
        assert_eq!(result.stderr(), "err");
        assert_eq!(result.error(), "err");
        assert_eq!(result.exit_code(), Some(3));
    }

    #[test]
    fn test_piped_blocking_silent_failure_message() {
        let executor = SubprocessExecutor::new();
        let result = run(&executor, "exit 7", &blocking_options());

        assert_eq!(
            result.error(),
            "Failed without error message: exit 7 (Exit code: 7)"
        );
    }

    #[test]
    fn test_piped_blocking_input() {
        let executor = SubprocessExecutor::new();
        let options = blocking_options();
        let mut input = InputSource::from("line one\nline two\n");
        let result = executor.execute(Invocation {
            command_line: "cat",
            options: &options,
            input: Some(&mut input),
        });

        assert_eq!(result.raw_stdout(), "line one\nline two\n");
    }

    #[test]
    fn test_unavailable_streaming_uses_blocking_pipes() {
        let executor = SubprocessExecutor::with_streaming_support(StreamingSupport::Unavailable);
        let options = ExecutionOptions::default().with_timeout_secs(30);
        let result = run(&executor, "echo fallback", &options);

        assert!(result.succeeded());
        assert_eq!(result.state(), ExecutionState::Completed);
    }

    #[test]
    fn test_spawn_failure_invalid_working_dir() {
        let executor = SubprocessExecutor::new();
        for options in [
            ExecutionOptions {
                working_dir: Some("/definitely/not/a/dir".into()),
                ..Default::default()
            },
            ExecutionOptions {
                working_dir: Some("/definitely/not/a/dir".into()),
                use_blocking_exec: true,
                ..Default::default()
            },
        ] {
            let result = run(&executor, "echo never", &options);

            assert!(!result.executed());
            assert_eq!(result.exit_code(), None);
            assert_eq!(result.state(), ExecutionState::SpawnFailed);
            let err = result.spawn_error().expect("spawn error");
            assert_eq!(err.command_line, "echo never");
        }
    }

    #[test]
    fn test_env_override_with_passthrough() {
        std::env::set_var("DOCEXEC_TEST_PASSTHROUGH", "kept");
        std::env::set_var("DOCEXEC_TEST_BLOCKED", "leaked");

        let executor = SubprocessExecutor::new();
        let mut env = HashMap::new();
        env.insert("GREETING".to_string(), "hi".to_string());
        let options = ExecutionOptions {
            environment: Some(env),
            env_passthrough: vec!["PATH".to_string(), "DOCEXEC_TEST_PASSTHROUGH".to_string()],
            ..Default::default()
        };
        let result = run(
            &executor,
            "echo \"$GREETING-$DOCEXEC_TEST_PASSTHROUGH-$DOCEXEC_TEST_BLOCKED\"",
            &options,
        );

        assert_eq!(result.stdout(), "hi-kept-");
    }

    #[test]
    fn test_filter_env() {
        std::env::set_var("DOCEXEC_TEST_ALLOWED_VAR", "value1");
        let executor = SubprocessExecutor::new();

        let filtered = executor.filter_env(&[
            "DOCEXEC_TEST_ALLOWED_VAR".to_string(),
            "DOCEXEC_TEST_UNSET_VAR".to_string(),
        ]);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered["DOCEXEC_TEST_ALLOWED_VAR"], "value1");
    }

    #[test]
    fn test_working_dir_applied() {
        let dir = tempfile::tempdir().unwrap();
        let executor = SubprocessExecutor::new();
        let options = ExecutionOptions {
            working_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = run(&executor, "pwd", &options);

        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(result.stdout()).canonicalize().unwrap(),
            expected
        );
    }

    #[test]
    fn test_exit_code_of_signal() {
        let executor = SubprocessExecutor::new();
        let result = run(&executor, "kill -KILL $$", &blocking_options());

        assert_eq!(result.exit_code(), Some(SIGNAL_EXIT_BASE + 9));
        assert!(result.duration_ms() < Duration::from_secs(5).as_millis() as u64);
    }
}
