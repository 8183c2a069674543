use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_CURRENCY: &str = "TND";
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;
const DEFAULT_ISSUER_NAME: &str = "Ma Société";
const DEFAULT_ISSUER_ADDRESS: &str = "Avenue de la Liberté, Tunis";
const DEFAULT_ISSUER_PHONE: &str = "+216 71 000 000";
const DEFAULT_ISSUER_EMAIL: &str = "contact@masociete.tn";
const DEFAULT_ISSUER_TAX_ID: &str = "0000000/A/M/000";

/// Directory containing configuration files
const CONFIG_DIR: &str = "config";

/// Identity block printed in the header of every document
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct IssuerConfig {
    #[serde(default = "default_issuer_name")]
    #[validate(length(min = 1, message = "Issuer name is required"))]
    pub name: String,

    #[serde(default = "default_issuer_address")]
    pub address: String,

    #[serde(default = "default_issuer_phone")]
    pub phone: String,

    #[serde(default = "default_issuer_email")]
    #[validate(email(message = "Issuer email must be valid"))]
    pub email: String,

    /// Fiscal identifier ("matricule fiscal") printed on documents.
    #[serde(default = "default_issuer_tax_id")]
    pub tax_id: String,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            name: default_issuer_name(),
            address: default_issuer_address(),
            phone: default_issuer_phone(),
            email: default_issuer_email(),
            tax_id: default_issuer_tax_id(),
        }
    }
}

/// Engine configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// ISO 4217 code printed next to payable amounts
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "Currency must be 3 characters"))]
    pub currency: String,

    /// Log level: trace, debug, info, warn, or error
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Buffered capacity of the domain event channel
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    #[serde(default)]
    #[validate]
    pub issuer: IssuerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            log_level: default_log_level(),
            log_json: false,
            event_channel_capacity: default_event_channel_capacity(),
            issuer: IssuerConfig::default(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum EngineConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

fn default_issuer_name() -> String {
    DEFAULT_ISSUER_NAME.to_string()
}

fn default_issuer_address() -> String {
    DEFAULT_ISSUER_ADDRESS.to_string()
}

fn default_issuer_phone() -> String {
    DEFAULT_ISSUER_PHONE.to_string()
}

fn default_issuer_email() -> String {
    DEFAULT_ISSUER_EMAIL.to_string()
}

fn default_issuer_tax_id() -> String {
    DEFAULT_ISSUER_TAX_ID.to_string()
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("gescom_core={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads engine configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (GESCOM__*)
pub fn load_config() -> Result<EngineConfig, EngineConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("GESCOM_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("currency", DEFAULT_CURRENCY)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("GESCOM").separator("__"))
        .build()?;

    let engine_config: EngineConfig = config.try_deserialize()?;

    engine_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        EngineConfigError::Validation(e)
    })?;

    Ok(engine_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.currency, "TND");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.event_channel_capacity, 128);
        assert_eq!(config.issuer.name, "Ma Société");
    }

    #[test]
    fn currency_must_be_three_characters() {
        let mut config = EngineConfig::default();
        config.currency = "DINAR".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_level_is_checked() {
        let mut config = EngineConfig::default();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());

        config.log_level = "WARN".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn event_channel_capacity_must_be_positive() {
        let mut config = EngineConfig::default();
        config.event_channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn issuer_email_is_checked() {
        let mut config = EngineConfig::default();
        config.issuer.email = "not-an-email".to_string();
        assert!(config.validate().is_err());
    }
}
