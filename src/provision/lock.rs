//! Advisory lock around provisioning
//!
//! The project volume may be mounted into several containers at once.
//! Only the holder of this lock may inspect-then-create a venv.

use crate::error::{BootError, BootResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exclusive lock on a file, released on drop
#[derive(Debug)]
pub struct ProvisionLock {
    file: File,
    path: PathBuf,
}

impl ProvisionLock {
    /// Block until the lock is held.
    ///
    /// Runs on tokio's blocking pool; provisioning has no timeout, so
    /// neither does waiting for another instance to finish it.
    pub async fn acquire(path: &Path) -> BootResult<Self> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::acquire_blocking(path))
            .await
            .map_err(|e| BootError::Internal(format!("lock task panicked: {e}")))?
    }

    fn acquire_blocking(path: PathBuf) -> BootResult<Self> {
        // Don't truncate before we hold the lock: the current holder's PID
        // lives in there.
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| BootError::LockFailed {
                path: path.clone(),
                source,
            })?;

        if file.try_lock_exclusive().is_err() {
            info!("Waiting for another instance to finish provisioning ({})", path.display());
            file.lock_exclusive().map_err(|source| BootError::LockFailed {
                path: path.clone(),
                source,
            })?;
        }
        debug!("Acquired provisioning lock {}", path.display());

        let mut file = file;
        file.set_len(0)
            .and_then(|_| writeln!(file, "{}", std::process::id()))
            .map_err(|e| BootError::io(format!("writing pid to {}", path.display()), e))?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProvisionLock {
    fn drop(&mut self) {
        // The file stays; removing it would race with waiters that already
        // opened it.
        let _ = self.file.unlock();
        debug!("Released provisioning lock {}", self.path.display());
    }
}
