//! CLI configuration.
//!
//! Settings live in a TOML file under the platform config directory and can
//! be overridden per invocation with `FACTBOOK_API_URL` or `--api-url`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the factbook backend.
    pub api_url: String,
    /// Timeout for plain request/response calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load the configuration, writing the default file on first run.
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::default_path()?)?;
        Ok(config.apply_env())
    }

    fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "factbook")
            .context("could not determine a config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config = toml::from_str(&raw)
                .with_context(|| format!("invalid config in {}", path.display()))?;
            Ok(config)
        } else {
            let config = Self::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, toml::to_string_pretty(&config)?)?;
            tracing::debug!("wrote default config to {}", path.display());
            Ok(config)
        }
    }

    fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var("FACTBOOK_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
        self
    }
}
