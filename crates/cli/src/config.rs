// Converter configuration: JSON file, then environment / flag overrides
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use docexec_core::domain::{ConverterConfig, ConverterKind};

/// Flags (and their environment variables) layered over the config file
#[derive(Args, Debug, Default)]
pub struct ConverterOverrides {
    /// JSON configuration file
    #[arg(long, env = "DOCEXEC_CONFIG")]
    pub config: Option<String>,

    /// Converter implementation (libreoffice)
    #[arg(long, env = "DOCEXEC_CONVERTER")]
    pub converter: Option<ConverterKind>,

    /// Converter binary path or name
    #[arg(long, env = "DOCEXEC_LIBREOFFICE_BIN")]
    pub binary: Option<String>,

    /// Converter user profile directory
    #[arg(long, env = "DOCEXEC_PROFILE_DIR")]
    pub profile: Option<String>,

    /// Kill the converter after this many seconds (0 = no limit)
    #[arg(long, env = "DOCEXEC_TIMEOUT_SECS")]
    pub timeout: Option<u64>,
}

/// Expand `~` and `$VAR` in a user supplied path
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).with_context(|| format!("Cannot expand path '{}'", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

impl ConverterOverrides {
    /// Resolve the effective converter configuration
    pub fn resolve(&self) -> Result<ConverterConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = expand_path(path)?;
                load_file(&path)?
            }
            None => ConverterConfig::default(),
        };

        if let Some(kind) = self.converter {
            config.kind = kind;
        }
        if let Some(binary) = &self.binary {
            config.binary = expand_path(binary)?;
        }
        if let Some(profile) = &self.profile {
            config.profile_dir = Some(expand_path(profile)?);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }

        config.validate().context("Invalid converter configuration")?;
        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<ConverterConfig> {
    ConverterConfig::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = ConverterOverrides::default().resolve().unwrap();
        assert_eq!(config.kind, ConverterKind::LibreOffice);
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docexec.json");
        std::fs::write(&path, r#"{ "binary": "soffice", "timeout_secs": 10 }"#).unwrap();

        let overrides = ConverterOverrides {
            config: Some(path.to_string_lossy().into_owned()),
            timeout: Some(60),
            ..Default::default()
        };
        let config = overrides.resolve().unwrap();

        assert_eq!(config.binary, PathBuf::from("soffice"));
        assert_eq!(config.timeout_secs, Some(60));
    }

    #[test]
    fn test_tilde_is_expanded() {
        std::env::set_var("HOME", "/home/docexec");
        assert_eq!(
            expand_path("~/profile").unwrap(),
            PathBuf::from("/home/docexec/profile")
        );
    }

    #[test]
    fn test_missing_file_is_reported() {
        let overrides = ConverterOverrides {
            config: Some("/nonexistent/docexec.json".to_string()),
            ..Default::default()
        };
        let err = overrides.resolve().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/docexec.json"));
    }
}
