// Shell quoting rules and argument rendering
use std::borrow::Cow;
use std::fmt;

use super::argument::{ArgValue, Argument, JOIN_MARKER};
use super::error::CommandError;

/// Quoting rules of the shell that will parse the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellDialect {
    /// `sh -c`: single-quote quoting
    Posix,
    /// `cmd /C`: double-quote quoting
    Windows,
}

impl ShellDialect {
    pub fn host() -> Self {
        if cfg!(windows) {
            ShellDialect::Windows
        } else {
            ShellDialect::Posix
        }
    }

    /// Quote one token so the shell reads it back as a single literal word
    pub fn quote<'a>(&self, token: &'a str) -> Cow<'a, str> {
        match self {
            ShellDialect::Posix => shell_words::quote(token),
            ShellDialect::Windows => Cow::Owned(quote_windows(token)),
        }
    }

    /// Render `argument` with this dialect's quoting
    ///
    /// `escape` applies to every token of the argument; the join marker is
    /// never quoted.
    pub fn render_argument(&self, argument: &Argument, escape: bool) -> String {
        let token = |text: &str| {
            if escape {
                self.quote(text).into_owned()
            } else {
                text.to_string()
            }
        };

        let value = match &argument.value {
            None => return token(&argument.key),
            Some(value) => value,
        };

        let values = match value {
            ArgValue::Scalar(v) => token(v),
            ArgValue::List(vs) => vs.iter().map(|v| token(v)).collect::<Vec<_>>().join(" "),
        };

        if argument.key.is_empty() {
            return values;
        }

        let (stem, joined) = argument.key_parts();
        let key = token(stem);
        if matches!(value, ArgValue::List(vs) if vs.is_empty()) {
            return key;
        }
        if joined {
            format!("{}{}{}", key, JOIN_MARKER, values)
        } else {
            format!("{} {}", key, values)
        }
    }
}

// cmd.exe has no reliable escape for these inside double quotes
fn quote_windows(token: &str) -> String {
    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for c in token.chars() {
        match c {
            '"' | '%' | '!' => quoted.push(' '),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Turns [`Argument`]s into command line text for a [`Command`](super::Command)
pub trait ArgumentRenderer: fmt::Debug + Send + Sync {
    /// Shell the rendered text is meant for
    fn dialect(&self) -> ShellDialect;

    /// # Errors
    /// - CommandError::InvalidLocale if rendering needs a locale that is unavailable
    fn render(&self, argument: &Argument) -> Result<String, CommandError>;
}

/// Plain dialect quoting: escapes unless the argument opts out
impl ArgumentRenderer for ShellDialect {
    fn dialect(&self) -> ShellDialect {
        *self
    }

    fn render(&self, argument: &Argument) -> Result<String, CommandError> {
        Ok(self.render_argument(argument, argument.escape.unwrap_or(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_renders_without_locale() {
        let rendered = ShellDialect::Posix
            .render(&Argument::option("--outdir", "/tmp/my reports"))
            .unwrap();
        assert_eq!(rendered, "--outdir '/tmp/my reports'");
    }

    #[test]
    fn test_dialect_honours_argument_override() {
        let rendered = ShellDialect::Posix
            .render(&Argument::positional("*.txt").escaped(false))
            .unwrap();
        assert_eq!(rendered, "*.txt");
    }

    #[test]
    fn test_windows_blanks_unquotable_characters() {
        assert_eq!(ShellDialect::Windows.quote("50% \"off\"!"), "\"50   off  \"");
        assert_eq!(ShellDialect::Windows.dialect(), ShellDialect::Windows);
    }
}
