// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{GovernorError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest, `ASSIST_GOVERNOR__SECTION__KEY`)
    /// 2. Config file (`~/.assist-governor/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Same as [`AppConfig::load`], with an explicit config file path.
    /// An explicit path must exist; the default one is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(&Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file
            .add_source(file)
            // Override with environment variables
            .add_source(
                Environment::with_prefix("ASSIST_GOVERNOR")
                    .separator("__")
            )
            .build()
            .map_err(|e| GovernorError::Config(e.to_string()))?;

        let app: AppConfig = config
            .try_deserialize()
            .map_err(|e| GovernorError::Config(e.to_string()))?;
        app.validate()?;
        Ok(app)
    }

    /// Reject configurations the governor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.max_size == 0 {
            return Err(GovernorError::Config("cache.max_size must be at least 1".to_string()));
        }
        for (name, provider) in &self.providers {
            if name == crate::providers::FALLBACK_PROVIDER {
                return Err(GovernorError::Config(format!(
                    "provider name '{}' is reserved",
                    name
                )));
            }
            if provider.endpoint.trim().is_empty() {
                return Err(GovernorError::Config(format!(
                    "provider '{}' has no endpoint",
                    name
                )));
            }
            if provider.timeout_secs == 0 {
                return Err(GovernorError::Config(format!(
                    "provider '{}' timeout_secs must be at least 1",
                    name
                )));
            }
            let limits = &provider.limits;
            if limits.requests_per_minute == 0
                || limits.requests_per_hour == 0
                || limits.max_concurrent == 0
            {
                return Err(GovernorError::Config(format!(
                    "provider '{}' limits must be positive",
                    name
                )));
            }
        }
        Ok(())
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".assist-governor")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
