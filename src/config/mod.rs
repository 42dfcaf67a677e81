//! Configuration management for venvboot

pub mod schema;

pub use schema::{Config, HandoffMode, Strategy};

use crate::error::{BootError, BootResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Default location of the config file inside the image
pub const DEFAULT_CONFIG_PATH: &str = "/etc/venvboot/config.toml";

/// Environment variables that override file configuration
pub mod env {
    pub const PROJECT_DIR: &str = "VENVBOOT_PROJECT_DIR";
    pub const STRATEGY: &str = "VENVBOOT_STRATEGY";
    pub const HANDOFF: &str = "VENVBOOT_HANDOFF";
    pub const CACHE_DIR: &str = "UV_CACHE_DIR";
    pub const LINK_MODE: &str = "UV_LINK_MODE";
    pub const PYTHON_PATH: &str = "PYTHONPATH";
}

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
    explicit: bool,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            explicit: false,
        }
    }

    /// Create a config manager with a custom path; the file must exist
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            explicit: true,
        }
    }

    /// Load file configuration, then overlay the process environment
    pub async fn load(&self) -> BootResult<Config> {
        let mut config = self.load_file().await?;
        apply_env(&mut config, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the file only, falling back to defaults
    pub async fn load_file(&self) -> BootResult<Config> {
        if !self.config_path.exists() {
            if self.explicit {
                return Err(BootError::ConfigNotFound(self.config_path.clone()));
            }
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> BootResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| BootError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| BootError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the process environment so tests stay hermetic.
/// Empty values are treated as unset.
pub fn apply_env<F>(config: &mut Config, lookup: F) -> BootResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(dir) = get(env::PROJECT_DIR) {
        config.project.dir = PathBuf::from(dir);
    }
    if let Some(strategy) = get(env::STRATEGY) {
        config.bootstrap.strategy = strategy
            .parse()
            .map_err(|_| BootError::invalid_value(env::STRATEGY, strategy, Strategy::VARIANTS))?;
    }
    if let Some(handoff) = get(env::HANDOFF) {
        config.bootstrap.handoff = handoff
            .parse()
            .map_err(|_| BootError::invalid_value(env::HANDOFF, handoff, HandoffMode::VARIANTS))?;
    }
    if let Some(cache) = get(env::CACHE_DIR) {
        config.project.cache = PathBuf::from(cache);
    }
    if let Some(mode) = get(env::LINK_MODE) {
        config.install.link_mode = mode;
    }
    if let Some(paths) = get(env::PYTHON_PATH) {
        for entry in std::env::split_paths(&paths) {
            if !entry.as_os_str().is_empty() && !config.install.python_path.contains(&entry) {
                config.install.python_path.push(entry);
            }
        }
    }

    Ok(())
}
