//! Provisioning marker
//!
//! Written inside a venv only after installation fully succeeds. The
//! fingerprint covers the inputs that shape the environment, so a later
//! start can tell it was built from a different configuration.

use crate::error::{BootError, BootResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::InstallRequest;

/// Proof of a completed provisioning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// venvboot version that wrote the marker
    pub version: String,

    /// Hash of the install inputs
    pub fingerprint: String,

    /// Distribution that was installed
    pub source: PathBuf,

    /// Interpreter request, if one was made
    pub python: Option<String>,

    pub provisioned_at: DateTime<Utc>,
}

impl Marker {
    /// Build a marker for a request that just finished installing
    pub fn for_request(request: &InstallRequest) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            fingerprint: fingerprint(request),
            source: request.source.clone(),
            python: request.python.clone(),
            provisioned_at: Utc::now(),
        }
    }

    /// Whether this marker was written for the same install inputs
    pub fn matches(&self, request: &InstallRequest) -> bool {
        self.fingerprint == fingerprint(request)
    }

    /// Read and parse a marker file
    pub async fn read(path: &Path) -> BootResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| BootError::io(format!("reading marker {}", path.display()), e))?;

        serde_json::from_str(&content).map_err(|e| BootError::MarkerCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write the marker via a temp file and rename, so readers never see
    /// a truncated file
    pub async fn write(&self, path: &Path) -> BootResult<()> {
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(self)?;

        fs::write(&tmp, content)
            .await
            .map_err(|e| BootError::io(format!("writing marker {}", tmp.display()), e))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| BootError::io(format!("renaming marker to {}", path.display()), e))
    }
}

/// SHA256 over source, interpreter request and link mode, first 16 hex chars
pub fn fingerprint(request: &InstallRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.source.to_string_lossy().as_bytes());
    hasher.update([0]);
    hasher.update(request.python.as_deref().unwrap_or("").as_bytes());
    hasher.update([0]);
    hasher.update(request.link_mode.as_bytes());
    let result = hasher.finalize();

    hex::encode(&result[..8])
}
