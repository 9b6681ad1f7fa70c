//! Configuration for invite-harvester

mod logging;
mod validation;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use validation::{
    ValidationConfig, DEFAULT_EXPIRY_PHRASES, DEFAULT_INVITE_HOST, DEFAULT_MIN_CODE_LENGTH,
    DEFAULT_USER_AGENTS,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Normalization, fetching, and classification settings
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate all configuration fields.
    ///
    /// Collects every problem and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();
        let v = &self.validation;

        if v.invite_host.trim().is_empty() {
            errors.push("invite_host must not be empty".to_string());
        } else if v.invite_host.contains('/') || v.invite_host.contains(':') {
            errors.push(format!(
                "invite_host must be a bare host name, got '{}'",
                v.invite_host
            ));
        }
        if v.min_code_length == 0 {
            errors.push("min_code_length must be positive".to_string());
        }
        if v.max_workers == 0 {
            errors.push("max_workers must be positive".to_string());
        }
        if v.max_workers > 256 {
            errors.push("max_workers must be <= 256".to_string());
        }
        if v.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be positive".to_string());
        }
        if v.scrape_timeout_secs == 0 {
            errors.push("scrape_timeout_secs must be positive".to_string());
        }
        if v.connect_timeout_secs == 0 {
            errors.push("connect_timeout_secs must be positive".to_string());
        }
        if v.max_redirects == 0 {
            errors.push("max_redirects must be positive".to_string());
        }
        if v.max_content_size == 0 {
            errors.push("max_content_size must be positive".to_string());
        }
        if v.expiry_phrases.iter().any(|p| p.trim().is_empty()) {
            errors.push("expiry_phrases must not contain empty phrases".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )
        }
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[validation]\nmax_workers = 4\nexpiry_phrases = [\"group was deleted\"]\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.validation.max_workers, 4);
        assert_eq!(config.validation.expiry_phrases, vec!["group was deleted".to_string()]);
        assert_eq!(config.validation.invite_host, DEFAULT_INVITE_HOST);
        assert_eq!(config.validation.min_code_length, DEFAULT_MIN_CODE_LENGTH);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = Config::default();
        config.validation.max_workers = 0;
        config.validation.min_code_length = 0;
        config.validation.invite_host = "https://chat.whatsapp.com/".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_workers"));
        assert!(err.contains("min_code_length"));
        assert!(err.contains("invite_host"));
    }

    #[test]
    fn test_zero_connect_timeout_and_redirects_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[validation]\nconnect_timeout_secs = 0\nmax_redirects = 0").unwrap();

        let err = format!("{:#}", Config::load(file.path()).unwrap_err());
        assert!(err.contains("connect_timeout_secs must be positive"));
        assert!(err.contains("max_redirects must be positive"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.validation.max_workers, 10);
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let rendered = Config::default().to_toml_string().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.validation.cache_ttl_secs, 3600);
        assert_eq!(parsed.validation.user_agents.len(), DEFAULT_USER_AGENTS.len());
    }
}
