// Document conversion models

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::argument::Argument;
use crate::AppError;

/// Known converter implementations, selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConverterKind {
    /// Office-suite headless converter (`libreoffice --headless --convert-to`)
    #[default]
    LibreOffice,
}

impl std::fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConverterKind::LibreOffice => write!(f, "libreoffice"),
        }
    }
}

impl FromStr for ConverterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "libreoffice" | "libre-office" | "soffice" => Ok(ConverterKind::LibreOffice),
            other => Err(format!("Unknown converter: {}", other)),
        }
    }
}

/// Converter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub kind: ConverterKind,
    /// Converter binary, a path or a name looked up on PATH
    pub binary: PathBuf,
    /// User profile directory handed to the converter
    pub profile_dir: Option<PathBuf>,
    /// Target filter, e.g. `pdf:writer_pdf_Export`
    pub filter: String,
    pub timeout_secs: Option<u64>,
}

pub const DEFAULT_LIBREOFFICE_BINARY: &str = "/usr/bin/libreoffice";
pub const DEFAULT_PROFILE_DIR: &str = "/tmp/docexec-libreoffice";
pub const DEFAULT_PDF_FILTER: &str = "pdf:writer_pdf_Export";

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            kind: ConverterKind::LibreOffice,
            binary: PathBuf::from(DEFAULT_LIBREOFFICE_BINARY),
            profile_dir: Some(PathBuf::from(DEFAULT_PROFILE_DIR)),
            filter: DEFAULT_PDF_FILTER.to_string(),
            timeout_secs: None,
        }
    }
}

impl ConverterConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.binary.as_os_str().is_empty() {
            return Err(AppError::Config("converter binary must not be empty".into()));
        }
        if self.filter.trim().is_empty() {
            return Err(AppError::Config("conversion filter must not be empty".into()));
        }
        Ok(())
    }
}

/// A request to convert one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub input: PathBuf,
    /// Target file path; its parent directory is created when missing
    pub output: PathBuf,
    /// Overrides the converter's configured profile directory
    pub profile_dir: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            profile_dir: None,
        }
    }

    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }
}

/// Validated invocation a converter wants the engine to run
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    pub program: PathBuf,
    pub arguments: Vec<Argument>,
    /// Where the converter is expected to write its output
    pub produced: PathBuf,
    pub working_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converter_kind_parsing() {
        assert_eq!(
            "LibreOffice".parse::<ConverterKind>(),
            Ok(ConverterKind::LibreOffice)
        );
        assert!("pandoc".parse::<ConverterKind>().is_err());
        assert_eq!(ConverterKind::LibreOffice.to_string(), "libreoffice");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ConverterConfig =
            serde_json::from_value(serde_json::json!({ "kind": "libre-office", "timeout_secs": 30 }))
                .unwrap();
        assert_eq!(config.kind, ConverterKind::LibreOffice);
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.filter, DEFAULT_PDF_FILTER);
        assert_eq!(config.binary, PathBuf::from(DEFAULT_LIBREOFFICE_BINARY));
    }

    #[test]
    fn test_config_rejects_empty_filter() {
        let err = ConverterConfig::from_json_str(r#"{ "filter": " " }"#).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = ConverterConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docexec.json");
        std::fs::write(&path, r#"{ "binary": "soffice", "profile_dir": null }"#).unwrap();

        let config = ConverterConfig::load(&path).unwrap();
        assert_eq!(config.binary, PathBuf::from("soffice"));
        assert_eq!(config.profile_dir, None);
    }
}
