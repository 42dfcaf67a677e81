//! Virtual environment provisioning
//!
//! A venv is provisioned at most once and never updated in place. Whether
//! that has happened is recorded explicitly instead of being inferred from
//! the directory existing.
//!
//! # Provisioning States
//!
//! | State | On disk | Action |
//! |-------|---------|--------|
//! | Unprovisioned | no venv, no sentinel | create + install |
//! | Partial | building sentinel present | discard venv, create + install |
//! | Provisioned | venv present, no sentinel | skip to handoff |
//!
//! The building sentinel sits next to the venv (not inside it) so that
//! removing a half-built venv never loses the evidence that it was
//! half-built. A venv with no marker and no sentinel was made by some
//! other tool and is adopted as-is, but only after taking the provisioning
//! lock: without it, such a venv is indistinguishable from one whose
//! creation is still in flight.

pub mod installer;
pub mod lock;
pub mod marker;
pub mod provisioner;

pub use installer::{InstallRequest, Installer, UvInstaller};
pub use lock::ProvisionLock;
pub use marker::Marker;
pub use provisioner::{Outcome, Provisioner};

use crate::error::{BootError, BootResult};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// File name of the marker written inside a finished venv
pub const MARKER_FILE: &str = ".venvboot.json";

/// A virtual environment location and its bookkeeping files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Venv {
    path: PathBuf,
}

impl Venv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the venv's executables
    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.path.join("Scripts")
        } else {
            self.path.join("bin")
        }
    }

    pub fn marker_path(&self) -> PathBuf {
        self.path.join(MARKER_FILE)
    }

    /// Present while a provisioning attempt is in flight or has failed
    pub fn sentinel_path(&self) -> PathBuf {
        self.sibling("building")
    }

    /// Advisory lock guarding check-and-create
    pub fn lock_path(&self) -> PathBuf {
        self.sibling("lock")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "venv".to_string());
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!(".{}.{}", name.trim_start_matches('.'), suffix))
    }

    /// Inspect the filesystem and classify this venv
    pub async fn state(&self) -> BootResult<ProvisionState> {
        if exists(&self.sentinel_path()).await? {
            return Ok(ProvisionState::Partial);
        }
        if !exists(&self.path).await? {
            return Ok(ProvisionState::Unprovisioned);
        }

        let marker_path = self.marker_path();
        if !exists(&marker_path).await? {
            return Ok(ProvisionState::Provisioned { marker: None });
        }

        match Marker::read(&marker_path).await {
            Ok(marker) => Ok(ProvisionState::Provisioned {
                marker: Some(marker),
            }),
            Err(e @ BootError::MarkerCorrupt { .. }) => {
                warn!("{}; treating environment as partial", e);
                Ok(ProvisionState::Partial)
            }
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for Venv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Provisioning state of a venv
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ProvisionState {
    /// Nothing there yet
    Unprovisioned,
    /// A previous attempt did not finish
    Partial,
    /// Ready; `marker` is `None` for adopted environments
    Provisioned { marker: Option<Marker> },
}

impl ProvisionState {
    pub fn is_provisioned(&self) -> bool {
        matches!(self, Self::Provisioned { .. })
    }
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unprovisioned => write!(f, "unprovisioned"),
            Self::Partial => write!(f, "partial"),
            Self::Provisioned { marker: Some(_) } => write!(f, "provisioned"),
            Self::Provisioned { marker: None } => write!(f, "provisioned (adopted)"),
        }
    }
}

async fn exists(path: &Path) -> BootResult<bool> {
    fs::try_exists(path)
        .await
        .map_err(|e| BootError::io(format!("checking {}", path.display()), e))
}
