use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding project-local configuration
pub const CONFIG_DIR: &str = ".project-assist";

/// Prefix of environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "PROJECT_ASSIST_";

/// Upper bound for `conversation.max_contract_retries`
pub const MAX_CONTRACT_RETRIES_LIMIT: u32 = 10;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Invalid {field}: '{value}'. Must be an http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Invalid {0}: must be at least 1")]
    ZeroValue(&'static str),

    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f32),

    #[error("Invalid max_contract_retries: {0}. Must be at most 10")]
    InvalidMaxContractRetries(u32),

    #[error("Invalid mail sender: '{0}'. Must be an email address")]
    InvalidMailSender(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .project-assist/config.yaml
    /// 3. .project-assist/local.yaml (optional overrides)
    /// 4. Environment variables (PROJECT_ASSIST_* prefix)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as [`ConfigLoader::load`] with the project root at `root`
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let dir = root.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file over the defaults
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file {} does not exist", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        // Generation backend
        let generation = &config.generation;
        check_url("generation.endpoint", &generation.endpoint)?;
        if generation.deployment.trim().is_empty() {
            return Err(ConfigError::EmptyField("generation.deployment"));
        }
        if generation.api_version.trim().is_empty() {
            return Err(ConfigError::EmptyField("generation.api_version"));
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ConfigError::InvalidTemperature(generation.temperature));
        }
        if generation.max_tokens == 0 {
            return Err(ConfigError::ZeroValue("generation.max_tokens"));
        }
        if generation.timeout_secs == 0 {
            return Err(ConfigError::ZeroValue("generation.timeout_secs"));
        }
        if generation.max_tool_rounds == 0 {
            return Err(ConfigError::ZeroValue("generation.max_tool_rounds"));
        }

        // Graph
        check_url("graph.base_url", &config.graph.base_url)?;
        if config.graph.timeout_secs == 0 {
            return Err(ConfigError::ZeroValue("graph.timeout_secs"));
        }
        if config.graph.requests_per_minute == 0 {
            return Err(ConfigError::ZeroValue("graph.requests_per_minute"));
        }

        if let Some(ref sender) = config.mail.sender {
            if !sender.contains('@') {
                return Err(ConfigError::InvalidMailSender(sender.clone()));
            }
        }

        if config.conversation.max_contract_retries > MAX_CONTRACT_RETRIES_LIMIT {
            return Err(ConfigError::InvalidMaxContractRetries(
                config.conversation.max_contract_retries,
            ));
        }

        // Logging
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        })
    }
}
