// Command line assembly
use crate::domain::{Command, CommandError, ShellDialect};
use crate::port::ExecutableResolver;

/// Separator between pre/post fragments and the main invocation
pub const FRAGMENT_SEPARATOR: &str = " && ";

/// Builds the full shell command line of a [`Command`]
pub struct CommandLineBuilder<'a> {
    resolver: &'a dyn ExecutableResolver,
    dialect: ShellDialect,
}

impl<'a> CommandLineBuilder<'a> {
    pub fn new(resolver: &'a dyn ExecutableResolver, dialect: ShellDialect) -> Self {
        Self { resolver, dialect }
    }

    /// Validate the program and assemble the command line
    ///
    /// # Errors
    /// - CommandError::NoExecutable if no program was set
    /// - CommandError::ExecutableNotFound if the program is missing or not executable
    pub fn build(&self, command: &Command) -> Result<String, CommandError> {
        let program = command.program().ok_or(CommandError::NoExecutable)?;
        self.resolver.resolve(program)?;

        let invocation = match self.dialect {
            ShellDialect::Windows => {
                rewrite_drive_prefix(program).unwrap_or_else(|| program.to_string())
            }
            // one shell word, even when the path contains spaces
            ShellDialect::Posix => ShellDialect::Posix
                .quote(program.trim_matches('"'))
                .into_owned(),
        };

        Ok(compose(
            command.pre_execute_fragment(),
            &invocation,
            command.args(),
            command.post_execute_fragment(),
        ))
    }

    /// Cached command line of `command`, building and caching it when stale
    pub fn resolve_line(&self, command: &mut Command) -> Result<String, CommandError> {
        if let Some(line) = command.cached_line() {
            return Ok(line.to_string());
        }
        let line = self.build(command)?;
        command.cache_line(line.clone());
        Ok(line)
    }
}

/// `[pre && ]program[ args][ && post]`
pub fn compose(pre: Option<&str>, program: &str, args: &[String], post: Option<&str>) -> String {
    let mut line = String::new();
    if let Some(pre) = pre {
        line.push_str(pre);
        line.push_str(FRAGMENT_SEPARATOR);
    }
    line.push_str(program);
    if !args.is_empty() {
        line.push(' ');
        line.push_str(&args.join(" "));
    }
    if let Some(post) = post {
        line.push_str(FRAGMENT_SEPARATOR);
        line.push_str(post);
    }
    line
}

/// `C:\dir\app.exe` becomes `C: && cd "C:\dir" && "app.exe"`
///
/// Returns `None` for programs without a drive letter prefix. Quoted paths
/// (`"C:\Program Files\app.exe"`) are accepted.
pub fn rewrite_drive_prefix(program: &str) -> Option<String> {
    let path = program.trim_matches('"');
    let bytes = path.as_bytes();
    if bytes.len() < 3 || !bytes[0].is_ascii_alphabetic() || bytes[1] != b':' {
        return None;
    }

    let split = path.rfind(&['\\', '/'][..])?;
    let mut dir = path[..split].to_string();
    if dir.len() == 2 {
        // drive root, "C:" alone would mean the drive's current directory
        dir.push('\\');
    }
    let exe = &path[split + 1..];
    let quote = |s: &str| ShellDialect::Windows.quote(s).into_owned();

    Some(format!(
        "{}:{}cd {}{}{}",
        &path[..1],
        FRAGMENT_SEPARATOR,
        quote(&dir),
        FRAGMENT_SEPARATOR,
        quote(exe)
    ))
}
