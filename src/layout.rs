//! Resolved filesystem layout for one bootstrap run

use crate::config::{Config, Strategy};
use crate::error::{BootError, BootResult};
use crate::provision::Venv;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Absolute paths derived from configuration
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// Project volume mount point
    pub project_dir: PathBuf,

    /// Environment the runner lives in (project venv or image venv)
    pub venv: Venv,

    /// uv download/build cache
    pub cache_dir: PathBuf,
}

impl Layout {
    /// Resolve paths for the configured strategy.
    ///
    /// Relative venv and cache paths are taken relative to the project
    /// directory; absolute ones are used unchanged.
    pub fn from_config(config: &Config) -> Self {
        let project_dir = config.project.dir.clone();
        let venv_path = match config.bootstrap.strategy {
            Strategy::Lazy => project_dir.join(&config.project.venv),
            Strategy::Eager => config.eager.venv.clone(),
        };
        let cache_dir = project_dir.join(&config.project.cache);

        Self {
            project_dir,
            venv: Venv::new(venv_path),
            cache_dir,
        }
    }

    /// The project directory is a mount and is never created here
    pub async fn check_project_dir(&self) -> BootResult<()> {
        match fs::metadata(&self.project_dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(BootError::ProjectDirNotDirectory(self.project_dir.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BootError::ProjectDirMissing(self.project_dir.clone()))
            }
            Err(e) => Err(BootError::io(
                format!("inspecting project directory {}", self.project_dir.display()),
                e,
            )),
        }
    }

    /// Create the cache directory if needed; idempotent
    pub async fn ensure_cache_dir(&self) -> BootResult<()> {
        ensure_dir(&self.cache_dir).await
    }
}

/// `mkdir -p` with error context
pub async fn ensure_dir(path: &Path) -> BootResult<()> {
    debug!("Ensuring directory {}", path.display());
    fs::create_dir_all(path)
        .await
        .map_err(|e| BootError::io(format!("creating directory {}", path.display()), e))
}
