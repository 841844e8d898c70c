//! Configuration management for the Tally host.
//!
//! Configuration is read from a TOML file with `[dispatcher]`,
//! `[translation]`, `[plugins]` and `[logging]` sections. Every section and
//! field has a default, so a partial file is valid.

use crate::builtin;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tally_events::{DispatcherConfig, PluginConfig};
use tally_i18n::FormatPolicy;
use tracing::info;

/// Environment variable that forces test mode on or off
pub const TEST_MODE_ENV: &str = "TALLY_TEST_MODE";

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub translation: TranslationSettings,
    #[serde(default)]
    pub plugins: PluginSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Translation catalog and formatting behavior
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSettings {
    /// JSON catalog file; without one every key translates to itself
    #[serde(default)]
    pub catalog_path: Option<String>,
    /// Fail on template/argument mismatches. Unset means strict in debug builds only.
    #[serde(default)]
    pub strict_formatting: Option<bool>,
}

impl TranslationSettings {
    pub fn format_policy(&self) -> FormatPolicy {
        match self.strict_formatting {
            Some(true) => FormatPolicy::Strict,
            Some(false) => FormatPolicy::Lenient,
            None => FormatPolicy::for_build(),
        }
    }
}

fn default_enabled_plugins() -> Vec<String> {
    vec![plugin_activity_log::PLUGIN_NAME.to_string()]
}

/// Plugin loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Built-in plugins to load, in load order
    #[serde(default = "default_enabled_plugins")]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub allow_version_mismatch: bool,
    #[serde(default)]
    pub strict_versioning: bool,
    #[serde(default)]
    pub max_plugins: Option<usize>,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled_plugins(),
            allow_version_mismatch: false,
            strict_versioning: false,
            max_plugins: None,
        }
    }
}

impl PluginSettings {
    pub fn to_plugin_config(&self) -> PluginConfig {
        PluginConfig {
            allow_version_mismatch: self.allow_version_mismatch,
            strict_versioning: self.strict_versioning,
            max_plugins: self.max_plugins,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

/// Interpret a `TALLY_TEST_MODE` value. Unrecognized values are ignored.
pub fn parse_test_mode(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, writing the defaults there first
    /// if the file does not exist.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Apply the `TALLY_TEST_MODE` environment override, if set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(TEST_MODE_ENV) {
            self.apply_test_mode_override(&value);
        }
    }

    fn apply_test_mode_override(&mut self, value: &str) {
        if let Some(test_mode) = parse_test_mode(value) {
            self.dispatcher.test_mode = test_mode;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        if self.dispatcher.record_pending && self.dispatcher.max_pending == 0 {
            return Err("dispatcher.max_pending must be greater than 0 when record_pending is set".to_string());
        }

        if self.plugins.max_plugins == Some(0) {
            return Err("plugins.max_plugins must be greater than 0".to_string());
        }

        for (index, name) in self.plugins.enabled.iter().enumerate() {
            if !builtin::is_builtin(name) {
                return Err(format!(
                    "Unknown plugin: {name}. Built-in plugins: {:?}",
                    builtin::builtin_names()
                ));
            }
            if self.plugins.enabled[..index].contains(name) {
                return Err(format!("Plugin listed twice: {name}"));
            }
        }

        if let Some(path) = &self.translation.catalog_path {
            if path.trim().is_empty() {
                return Err("translation.catalog_path cannot be empty".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(!config.dispatcher.test_mode);
        assert!(config.dispatcher.record_pending);
        assert_eq!(config.plugins.enabled, vec!["ActivityLog".to_string()]);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.translation.catalog_path, None);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tally.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        // The written defaults load back unchanged
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[dispatcher]
test_mode = true
max_pending = 16

[translation]
catalog_path = "lang/en.json"
strict_formatting = false

[plugins]
enabled = []
max_plugins = 4

[logging]
level = "debug"
json_format = true
"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).await.unwrap();
        assert!(config.dispatcher.test_mode);
        assert!(config.dispatcher.record_pending);
        assert_eq!(config.dispatcher.max_pending, 16);
        assert_eq!(config.translation.catalog_path.as_deref(), Some("lang/en.json"));
        assert_eq!(config.translation.format_policy(), FormatPolicy::Lenient);
        assert!(config.plugins.enabled.is_empty());
        assert_eq!(config.plugins.to_plugin_config().max_plugins, Some(4));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"warn\"").unwrap();

        let config = AppConfig::load_from_file(file.path()).await.unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.dispatcher, DispatcherConfig::default());
        assert_eq!(config.plugins, PluginSettings::default());
    }

    #[tokio::test]
    async fn test_invalid_toml_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[dispatcher\ntest_mode = maybe").unwrap();
        assert!(AppConfig::load_from_file(file.path()).await.is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_plugins() {
        let mut config = AppConfig::default();
        config.plugins.enabled.push("ActivityLog".to_string());
        assert!(config.validate().unwrap_err().contains("twice"));

        config.plugins.enabled = vec!["Unknown".to_string()];
        assert!(config.validate().unwrap_err().contains("Unknown plugin"));

        config.plugins.enabled.clear();
        config.plugins.max_plugins = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_pending_queue() {
        let mut config = AppConfig::default();
        config.dispatcher.max_pending = 0;
        assert!(config.validate().is_err());

        config.dispatcher.record_pending = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_test_mode_override() {
        assert_eq!(parse_test_mode("1"), Some(true));
        assert_eq!(parse_test_mode(" TRUE "), Some(true));
        assert_eq!(parse_test_mode("off"), Some(false));
        assert_eq!(parse_test_mode("sometimes"), None);

        let mut config = AppConfig::default();
        config.apply_test_mode_override("yes");
        assert!(config.dispatcher.test_mode);
        config.apply_test_mode_override("garbage");
        assert!(config.dispatcher.test_mode);
        config.apply_test_mode_override("0");
        assert!(!config.dispatcher.test_mode);
    }

    #[test]
    fn test_format_policy_selection() {
        let mut settings = TranslationSettings::default();
        assert_eq!(settings.format_policy(), FormatPolicy::for_build());
        settings.strict_formatting = Some(true);
        assert_eq!(settings.format_policy(), FormatPolicy::Strict);
    }
}
