// Argument escaping (platform- and locale-aware)
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub use crate::domain::escaping::ShellDialect;

use crate::domain::{ArgumentRenderer, Argument, CommandError};
use crate::port::LocaleControl;

/// Scoped LC_CTYPE switch; the previous locale is restored on drop
pub struct LocaleGuard<'a> {
    control: &'a dyn LocaleControl,
    previous: Option<String>,
}

impl<'a> LocaleGuard<'a> {
    /// Save the current locale and switch to `locale`
    ///
    /// # Errors
    /// - CommandError::InvalidLocale if the locale cannot be set; the current
    ///   locale is left untouched
    pub fn acquire(control: &'a dyn LocaleControl, locale: &str) -> Result<Self, CommandError> {
        let previous = control.current();
        if !control.set(locale) {
            return Err(CommandError::InvalidLocale(locale.to_string()));
        }
        Ok(Self { control, previous })
    }
}

impl Drop for LocaleGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if !self.control.set(&previous) {
                debug!(locale = %previous, "Failed to restore previous locale");
            }
        }
    }
}

/// Renders [`Argument`]s into command line text
#[derive(Clone)]
pub struct ArgumentEscaper {
    dialect: ShellDialect,
    escape_by_default: bool,
    locale: Option<(String, Arc<dyn LocaleControl>)>,
}

impl ArgumentEscaper {
    pub fn new(dialect: ShellDialect) -> Self {
        Self {
            dialect,
            escape_by_default: true,
            locale: None,
        }
    }

    /// Default policy for arguments without their own override
    pub fn escape_by_default(mut self, escape: bool) -> Self {
        self.escape_by_default = escape;
        self
    }

    /// Escape under `locale`, switched through `control` for each argument
    pub fn with_locale(mut self, locale: impl Into<String>, control: Arc<dyn LocaleControl>) -> Self {
        self.locale = Some((locale.into(), control));
        self
    }

    pub fn dialect(&self) -> ShellDialect {
        self.dialect
    }

    /// Render one argument into its command line text
    ///
    /// # Errors
    /// - CommandError::InvalidLocale if a configured locale is unavailable
    pub fn render(&self, argument: &Argument) -> Result<String, CommandError> {
        let escape = argument.escape.unwrap_or(self.escape_by_default);

        match &self.locale {
            Some((locale, control)) if escape => {
                let _guard = LocaleGuard::acquire(control.as_ref(), locale)?;
                Ok(self.dialect.render_argument(argument, escape))
            }
            _ => Ok(self.dialect.render_argument(argument, escape)),
        }
    }
}

impl ArgumentRenderer for ArgumentEscaper {
    fn dialect(&self) -> ShellDialect {
        self.dialect
    }

    fn render(&self, argument: &Argument) -> Result<String, CommandError> {
        ArgumentEscaper::render(self, argument)
    }
}

impl Default for ArgumentEscaper {
    fn default() -> Self {
        Self::new(ShellDialect::host())
    }
}

impl fmt::Debug for ArgumentEscaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentEscaper")
            .field("dialect", &self.dialect)
            .field("escape_by_default", &self.escape_by_default)
            .field("locale", &self.locale.as_ref().map(|(l, _)| l))
            .finish()
    }
}
