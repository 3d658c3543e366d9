#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{validate_base_url, validate_timeout, validate_token_path, Validate};
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_TOKEN_PATH: &str = ".gradebook/token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Effective settings: flag, then config file, then default.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub token_path: String,
    pub log_format: LogFormat,
    pub log_level: Option<String>,
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub token_path: Option<String>,
}

impl ClientSettings {
    pub fn resolve(file: Option<&TomlConfig>, overrides: Overrides) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();
        file.validate()?;

        let log_format = match file.logging.format.as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let settings = Self {
            base_url: overrides
                .base_url
                .or(file.api.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_seconds: overrides
                .timeout_seconds
                .or(file.api.timeout_seconds)
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            token_path: overrides
                .token_path
                .or(file.session.token_path)
                .unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string()),
            log_format,
            log_level: file.logging.level,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Validate for ClientSettings {
    fn validate(&self) -> Result<()> {
        validate_base_url("base_url", &self.base_url)?;
        validate_timeout("timeout_seconds", self.timeout_seconds)?;
        validate_token_path("token_path", &self.token_path)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
impl cli::CliConfig {
    /// Loads `--config` when given and folds the flags on top.
    pub fn settings(&self) -> Result<ClientSettings> {
        let file = match &self.config {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None => None,
        };
        ClientSettings::resolve(
            file.as_ref(),
            Overrides {
                base_url: self.base_url.clone(),
                timeout_seconds: self.timeout_seconds,
                token_path: self.session_file.clone(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let settings = ClientSettings::resolve(None, Overrides::default()).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert_eq!(settings.token_path, DEFAULT_TOKEN_PATH);
        assert_eq!(settings.log_format, LogFormat::Text);
    }

    #[test]
    fn flags_beat_file_values() {
        let file = TomlConfig::from_toml_str(
            "[api]\nbase_url = \"http://file:8080\"\ntimeout_seconds = 5\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();
        let settings = ClientSettings::resolve(
            Some(&file),
            Overrides {
                base_url: Some("https://flag.example".into()),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(settings.base_url, "https://flag.example");
        assert_eq!(settings.timeout_seconds, 5);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_flag_values_are_rejected() {
        let result = ClientSettings::resolve(
            None,
            Overrides {
                base_url: Some("localhost:8080".into()),
                ..Overrides::default()
            },
        );
        assert!(result.is_err());

        let result = ClientSettings::resolve(
            None,
            Overrides {
                timeout_seconds: Some(0),
                ..Overrides::default()
            },
        );
        assert!(result.is_err());
    }
}
