// Argument Domain Model

use serde::{Deserialize, Serialize};

/// Trailing key marker that glues key and value together (`--name=value`)
pub const JOIN_MARKER: char = '=';

/// Value of a command argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Scalar(String),
    /// Repeated-value argument, e.g. `--exclude val1 val2`
    List(Vec<String>),
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Scalar(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Scalar(s)
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(values: Vec<String>) -> Self {
        ArgValue::List(values)
    }
}

impl From<Vec<&str>> for ArgValue {
    fn from(values: Vec<&str>) -> Self {
        ArgValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// A single command line argument before rendering
///
/// `key` may be empty for a positional argument. `escape` overrides the
/// escaper's default policy when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub key: String,
    pub value: Option<ArgValue>,
    pub escape: Option<bool>,
}

impl Argument {
    /// Key-only argument (`--headless`)
    pub fn flag(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            escape: None,
        }
    }

    /// Key with a value (`--outdir dir`, or `--name=value` for keys ending in `=`)
    pub fn option(key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            escape: None,
        }
    }

    /// Key followed by several independently escaped values
    pub fn repeated<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            value: Some(ArgValue::List(values.into_iter().map(Into::into).collect())),
            escape: None,
        }
    }

    /// Bare value with no key (e.g. a trailing file path)
    pub fn positional(value: impl Into<String>) -> Self {
        Self {
            key: String::new(),
            value: Some(ArgValue::Scalar(value.into())),
            escape: None,
        }
    }

    /// Force escaping on or off for this argument only
    pub fn escaped(mut self, escape: bool) -> Self {
        self.escape = Some(escape);
        self
    }

    /// Split off the join marker: `("--name", true)` for `--name=`
    pub fn key_parts(&self) -> (&str, bool) {
        match self.key.strip_suffix(JOIN_MARKER) {
            Some(stem) => (stem, true),
            None => (self.key.as_str(), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parts_detects_join_marker() {
        let arg = Argument::option("--name=", "value");
        assert_eq!(arg.key_parts(), ("--name", true));

        let arg = Argument::option("--outdir", "/tmp");
        assert_eq!(arg.key_parts(), ("--outdir", false));
    }

    #[test]
    fn test_repeated_preserves_order() {
        let arg = Argument::repeated("--exclude", ["b", "a", "c"]);
        assert_eq!(
            arg.value,
            Some(ArgValue::List(vec![
                "b".to_string(),
                "a".to_string(),
                "c".to_string()
            ]))
        );
    }

    #[test]
    fn test_positional_has_empty_key() {
        let arg = Argument::positional("/tmp/in.docx").escaped(false);
        assert!(arg.key.is_empty());
        assert_eq!(arg.escape, Some(false));
    }
}
