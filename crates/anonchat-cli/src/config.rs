//! Anonchat CLI Configuration Management
//!
//! Configuration is layered with figment, later layers winning:
//! defaults, `anonchat.toml` in the working directory, the file given with
//! `--config`, then environment variables prefixed `ANONCHAT_` with `__`
//! separating nested keys (`ANONCHAT_CORE__MATCHING__FALLBACK=enqueue`).

use std::path::Path;

use anonchat_core::AnonchatConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "anonchat.toml";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "ANONCHAT_";

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the anonchat CLI application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliAppConfig {
    /// Engine and runtime configuration
    pub core: AnonchatConfig,

    /// Console front end settings
    pub cli: CliConfig,
}

/// CLI-specific configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Enable verbose logging output
    pub verbose: bool,

    /// Prompt printed before each input line; empty disables it
    pub prompt: String,

    /// Map free text after `interest` onto a catalog tag with the classifier
    pub classify_free_text: bool,

    /// Drop messages the classifier flags as toxic
    pub filter_toxic: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            prompt: "anonchat> ".to_string(),
            classify_free_text: true,
            filter_toxic: false,
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl CliAppConfig {
    /// Load configuration with the standard priority order
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(config_path)?)
    }

    /// Build the layered figment without extracting it
    pub fn figment(config_path: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(DEFAULT_CONFIG_FILE));

        if let Some(path) = config_path {
            // A missing default file is fine, a missing explicit one is not
            if !path.exists() {
                return Err(ConfigError::Loading(format!(
                    "configuration file {} does not exist",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration from any figment
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: CliAppConfig = figment
            .extract()
            .map_err(|e| ConfigError::Loading(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.core
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        let mut example = CliAppConfig::default();
        example.core.interests.tags.push("Fitness".to_string());
        example.cli.filter_toxic = true;

        example
            .to_toml()
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use anonchat_core::FallbackPolicy;

    fn defaults() -> Figment {
        Figment::new().merge(Serialized::defaults(CliAppConfig::default()))
    }

    #[test]
    fn test_default_config_creation() {
        let config = CliAppConfig::default();
        assert!(!config.cli.verbose);
        assert_eq!(config.cli.prompt, "anonchat> ");
        assert_eq!(config.core.matching.fallback, FallbackPolicy::Fifo);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = defaults().merge(Toml::string(
            r#"
            [core.matching]
            fallback = "enqueue"
            report_alert_threshold = 5

            [cli]
            prompt = ""
            "#,
        ));

        let config = CliAppConfig::from_figment(figment).expect("config should load");
        assert_eq!(config.core.matching.fallback, FallbackPolicy::Enqueue);
        assert_eq!(config.core.matching.report_alert_threshold, 5);
        assert!(config.core.matching.unset_matches_unset);
        assert_eq!(config.cli.prompt, "");
        assert!(config.cli.classify_free_text);
    }

    #[test]
    fn test_invalid_catalog_is_rejected() {
        let figment = defaults().merge(Toml::string(
            r#"
            [core.interests]
            tags = ["Music", "music"]
            "#,
        ));

        assert!(matches!(
            CliAppConfig::from_figment(figment),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = CliAppConfig::load(Some(Path::new("/definitely/not/here/anonchat.toml")));
        assert!(matches!(result, Err(ConfigError::Loading(_))));
    }

    #[test]
    fn test_example_config_round_trips() {
        let example = CliAppConfig::example_config();
        assert!(example.contains("[cli]"));
        assert!(example.contains("[core.matching]"));

        let config = CliAppConfig::from_figment(defaults().merge(Toml::string(&example)))
            .expect("example config should load");
        assert!(config.core.interests.tags.iter().any(|t| t == "Fitness"));
        assert!(config.cli.filter_toxic);
    }
}
