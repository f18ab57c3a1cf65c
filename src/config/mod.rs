// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{OfflineError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the caller)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(&Self::default_config_path()))
    }

    /// Same layering as [`AppConfig::load`] with an explicit config file path.
    /// A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file if it exists
            .add_source(File::from(path).required(false))
            // Override with environment variables (e.g. FIRECACHE_UPSTREAM__BASE_URL)
            .add_source(
                Environment::with_prefix("FIRECACHE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| OfflineError::Config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| OfflineError::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations the router cannot work with.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.upstream.base_url)
            .map_err(|e| OfflineError::Config(format!("upstream.base_url: {}", e)))?;

        let generations = &self.generations;
        if generations.static_name.is_empty() || generations.api_name.is_empty() {
            return Err(OfflineError::Config(
                "generation names must not be empty".to_string(),
            ));
        }
        if generations.static_name == generations.api_name {
            return Err(OfflineError::Config(format!(
                "static and api generations share the name '{}'",
                generations.static_name
            )));
        }
        if !generations.api_prefix.starts_with('/') {
            return Err(OfflineError::Config(format!(
                "api_prefix '{}' must start with '/'",
                generations.api_prefix
            )));
        }
        Ok(())
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".firecache")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
