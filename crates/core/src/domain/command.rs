// Command Domain Model
//
// A Command is a single-use descriptor: program, rendered arguments, shell
// fragments, execution options, optional stdin and the result of its last run.

use std::sync::Arc;

use super::argument::Argument;
use super::error::CommandError;
use super::escaping::{ArgumentRenderer, ShellDialect};
use super::input::InputSource;
use super::options::ExecutionOptions;
use super::result::ExecutionResult;

#[derive(Debug)]
pub struct Command {
    program: Option<String>,
    args: Vec<String>,
    pre_execute: Option<String>,
    post_execute: Option<String>,
    options: ExecutionOptions,
    input: Option<InputSource>,
    renderer: Arc<dyn ArgumentRenderer>,
    exec_line: Option<String>,
    result: ExecutionResult,
}

impl Default for Command {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            pre_execute: None,
            post_execute: None,
            options: ExecutionOptions::default(),
            input: None,
            renderer: Arc::new(ShellDialect::host()),
            exec_line: None,
            result: ExecutionResult::default(),
        }
    }
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: Some(program.into()),
            ..Default::default()
        }
    }

    /// Replace the renderer used for arguments added from now on
    pub fn with_escaper(mut self, renderer: impl ArgumentRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_program(&mut self, program: impl Into<String>) -> &mut Self {
        self.program = Some(program.into());
        self.exec_line = None;
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref().filter(|p| !p.is_empty())
    }

    /// Render and append one argument; its text is fixed from here on
    pub fn add_arg(&mut self, argument: Argument) -> Result<&mut Self, CommandError> {
        let rendered = self.renderer.render(&argument)?;
        self.args.push(rendered);
        self.exec_line = None;
        Ok(self)
    }

    pub fn add_args<I>(&mut self, arguments: I) -> Result<&mut Self, CommandError>
    where
        I: IntoIterator<Item = Argument>,
    {
        for argument in arguments {
            self.add_arg(argument)?;
        }
        Ok(self)
    }

    /// Append caller-owned argument text verbatim (never escaped)
    pub fn raw_args(&mut self, args: impl Into<String>) -> &mut Self {
        self.args.push(args.into());
        self.exec_line = None;
        self
    }

    /// Shell fragment run before the program, joined with `&&`
    pub fn pre_execute(&mut self, fragment: impl Into<String>) -> &mut Self {
        self.pre_execute = Some(fragment.into()).filter(|f| !f.is_empty());
        self.exec_line = None;
        self
    }

    /// Shell fragment run after the program, joined with `&&`
    pub fn post_execute(&mut self, fragment: impl Into<String>) -> &mut Self {
        self.post_execute = Some(fragment.into()).filter(|f| !f.is_empty());
        self.exec_line = None;
        self
    }

    pub fn stdin(&mut self, input: impl Into<InputSource>) -> &mut Self {
        self.input = Some(input.into());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn pre_execute_fragment(&self) -> Option<&str> {
        self.pre_execute.as_deref()
    }

    pub fn post_execute_fragment(&self) -> Option<&str> {
        self.post_execute.as_deref()
    }

    pub fn renderer(&self) -> &dyn ArgumentRenderer {
        self.renderer.as_ref()
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ExecutionOptions {
        &mut self.options
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Result of the last run (empty before the first one)
    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    /// Command line computed by the last successful build, if still valid
    pub fn cached_line(&self) -> Option<&str> {
        self.exec_line.as_deref()
    }

    pub(crate) fn cache_line(&mut self, line: String) {
        self.exec_line = Some(line);
    }

    /// Options and input borrowed together for one run
    pub(crate) fn invocation_parts(&mut self) -> (&ExecutionOptions, Option<&mut InputSource>) {
        (&self.options, self.input.as_mut())
    }

    /// Start an in-memory stdin payload over for the next run
    pub(crate) fn rewind_input(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.rewind();
        }
    }

    pub(crate) fn reset_result(&mut self) {
        self.result = ExecutionResult::default();
    }

    pub(crate) fn set_result(&mut self, result: ExecutionResult) -> &ExecutionResult {
        self.result = result;
        &self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posix_command(program: &str) -> Command {
        Command::new(program).with_escaper(ShellDialect::Posix)
    }

    #[test]
    fn test_rendered_args_are_kept_in_order() {
        let mut cmd = posix_command("tar");
        cmd.add_arg(Argument::flag("-c"))
            .unwrap()
            .add_arg(Argument::option("--file", "out file.tar"))
            .unwrap();
        cmd.raw_args("$HOME/src");

        assert_eq!(cmd.args(), &["-c", "--file 'out file.tar'", "$HOME/src"]);
    }

    #[test]
    fn test_mutation_invalidates_cached_line() {
        let mut cmd = posix_command("ls");
        cmd.cache_line("ls".to_string());
        assert_eq!(cmd.cached_line(), Some("ls"));

        cmd.add_arg(Argument::flag("-l")).unwrap();
        assert_eq!(cmd.cached_line(), None);
    }

    #[test]
    fn test_empty_program_is_none() {
        assert_eq!(Command::new("").program(), None);
        assert_eq!(Command::default().program(), None);
    }

    #[test]
    fn test_default_renderer_quotes_for_host_shell() {
        let mut cmd = Command::new("ls");
        cmd.add_arg(Argument::positional("a b")).unwrap();

        assert_eq!(cmd.renderer().dialect(), ShellDialect::host());
        assert_eq!(cmd.args(), &[ShellDialect::host().quote("a b").into_owned()]);
    }

    #[test]
    fn test_rewind_input_replays_payload() {
        let mut cmd = posix_command("cat");
        cmd.stdin("again");
        let mut sink = Vec::new();
        cmd.invocation_parts().1.unwrap().copy_all(&mut sink).unwrap();

        cmd.rewind_input();
        let mut replay = Vec::new();
        cmd.invocation_parts().1.unwrap().copy_all(&mut replay).unwrap();
        assert_eq!(replay, b"again");
    }

    #[test]
    fn test_empty_fragments_are_ignored() {
        let mut cmd = posix_command("ls");
        cmd.pre_execute("");
        assert_eq!(cmd.pre_execute_fragment(), None);
    }
}
