// Command runner: pre-flight + delegation to the process executor
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{Command, CommandError, ExecutionResult};
use crate::port::{ExecutableResolver, Invocation, ProcessExecutor};

use super::command_line::CommandLineBuilder;

/// Executes [`Command`]s through the injected ports
///
/// Pre-flight problems (no program, program not found, bad locale) are
/// returned as `Err` and no process is spawned. Everything that happens after
/// that is recorded in the command's [`ExecutionResult`].
#[derive(Clone)]
pub struct CommandRunner {
    resolver: Arc<dyn ExecutableResolver>,
    executor: Arc<dyn ProcessExecutor>,
}

impl CommandRunner {
    pub fn new(resolver: Arc<dyn ExecutableResolver>, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self { resolver, executor }
    }

    /// Full command line of `command` (cached on the command)
    pub fn command_line(&self, command: &mut Command) -> Result<String, CommandError> {
        let dialect = command.renderer().dialect();
        CommandLineBuilder::new(self.resolver.as_ref(), dialect).resolve_line(command)
    }

    /// Run `command` once and return its freshly populated result
    ///
    /// # Errors
    /// - CommandError::NoExecutable / ExecutableNotFound before spawning
    pub fn execute<'c>(&self, command: &'c mut Command) -> Result<&'c ExecutionResult, CommandError> {
        command.reset_result();
        command.rewind_input();
        let line = self.command_line(command)?;

        let (options, input) = command.invocation_parts();
        info!(
            command = %line,
            has_input = input.is_some(),
            timeout = ?options.timeout,
            working_dir = ?options.working_dir,
            "Starting command execution"
        );

        let result = self.executor.execute(Invocation {
            command_line: &line,
            options,
            input,
        });

        if result.succeeded() {
            info!(
                command = %line,
                duration_ms = result.duration_ms(),
                "Command execution completed"
            );
        } else {
            warn!(
                command = %line,
                state = %result.state(),
                exit_code = ?result.exit_code(),
                timed_out = result.timed_out(),
                error = %result.error(),
                "Command execution failed"
            );
        }

        Ok(command.set_result(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::escaper::{ArgumentEscaper, ShellDialect};
    use crate::domain::{Argument, ExecutionState};
    use crate::port::executable_resolver::mocks::MockResolver;
    use crate::port::process_executor::mocks::{MockBehavior, MockProcessExecutor};

    fn runner(executor: Arc<MockProcessExecutor>) -> CommandRunner {
        CommandRunner::new(Arc::new(MockResolver::new(&["echo", "cat"])), executor)
    }

    fn command(program: &str) -> Command {
        Command::new(program).with_escaper(ArgumentEscaper::new(ShellDialect::Posix))
    }

    #[test]
    fn test_execute_success() {
        let executor = Arc::new(MockProcessExecutor::new_success("hello\n"));
        let mut cmd = command("echo");
        cmd.add_arg(Argument::positional("hello")).unwrap();

        let result = runner(executor.clone()).execute(&mut cmd).unwrap();

        assert!(result.succeeded());
        assert_eq!(result.stdout(), "hello");
        assert_eq!(executor.command_lines(), vec!["echo hello"]);
    }

    #[test]
    fn test_missing_executable_never_reaches_executor() {
        let executor = Arc::new(MockProcessExecutor::new_success(""));
        let mut cmd = command("/nonexistent/tool");

        let err = runner(executor.clone()).execute(&mut cmd).unwrap_err();

        assert_eq!(
            err,
            CommandError::ExecutableNotFound("/nonexistent/tool".to_string())
        );
        assert_eq!(executor.call_count(), 0);
        assert_eq!(cmd.result().exit_code(), None);
        assert_eq!(cmd.result().state(), ExecutionState::NotStarted);
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let executor = Arc::new(MockProcessExecutor::new_fail(2, "bad input"));
        let mut cmd = command("cat");

        let result = runner(executor).execute(&mut cmd).unwrap();

        assert!(result.executed());
        assert_eq!(result.exit_code(), Some(2));
        assert_eq!(result.error(), "bad input");
    }

    #[test]
    fn test_input_is_handed_to_executor() {
        let executor = Arc::new(MockProcessExecutor::new_success(""));
        let mut cmd = command("cat");
        cmd.stdin("piped data");

        runner(executor.clone()).execute(&mut cmd).unwrap();

        assert_eq!(executor.inputs(), vec![b"piped data".to_vec()]);
    }

    #[test]
    fn test_rerun_sends_same_input_again() {
        let executor = Arc::new(MockProcessExecutor::new_success(""));
        let runner = runner(executor.clone());
        let mut cmd = command("cat");
        cmd.stdin("piped data");

        runner.execute(&mut cmd).unwrap();
        runner.execute(&mut cmd).unwrap();

        assert_eq!(
            executor.inputs(),
            vec![b"piped data".to_vec(), b"piped data".to_vec()]
        );
    }

    #[test]
    fn test_rerun_resets_previous_result() {
        let executor = Arc::new(MockProcessExecutor::new(MockBehavior::SpawnFail(
            "permission denied".to_string(),
        )));
        let runner = runner(executor);
        let mut cmd = command("echo");

        let first = runner.execute(&mut cmd).unwrap().clone();
        assert_eq!(first.state(), ExecutionState::SpawnFailed);

        // Program vanishes between runs: the stale result must not survive
        cmd.set_program("/gone");
        assert!(runner.execute(&mut cmd).is_err());
        assert_eq!(cmd.result().state(), ExecutionState::NotStarted);
        assert!(cmd.result().spawn_error().is_none());
    }

    #[test]
    fn test_timeout_result_passes_through() {
        let executor = Arc::new(MockProcessExecutor::new(MockBehavior::Timeout));
        let mut cmd = command("echo");

        let result = runner(executor).execute(&mut cmd).unwrap();

        assert!(result.executed());
        assert!(result.timed_out());
        assert_ne!(result.exit_code(), Some(0));
    }
}
