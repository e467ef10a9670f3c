//! CLI configuration

use std::path::PathBuf;

use core_kernel::Currency;
use serde::Deserialize;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    pub log_format: LogFormat,
    /// JSON rule book; the built-in tables are used when unset
    pub rules_path: Option<PathBuf>,
    /// Currency for intakes that do not name one
    pub currency: Currency,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            rules_path: None,
            currency: Currency::INR,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `UW_`-prefixed environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::with_prefix("UW"))
    }

    /// Loads configuration from an environment source over the defaults
    pub fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("log_level", "info")?
            .set_default("log_format", "text")?
            .set_default("currency", "INR")?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}
