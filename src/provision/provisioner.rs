//! Check-and-create for a single venv

use crate::error::{BootError, BootResult};
use crate::layout::ensure_dir;
use std::io::ErrorKind;
use tokio::fs;
use tracing::{debug, info, warn};

use super::{InstallRequest, Installer, Marker, ProvisionLock, ProvisionState, Venv};

/// What `Provisioner::ensure` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Venv was already usable; nothing ran
    AlreadyProvisioned { marker: Option<Marker> },
    /// Venv was created and the distribution installed
    Provisioned(Marker),
}

impl Outcome {
    pub fn did_install(&self) -> bool {
        matches!(self, Self::Provisioned(_))
    }
}

/// Drives an `Installer` through the provisioning state machine
pub struct Provisioner<I> {
    installer: I,
}

impl<I: Installer> Provisioner<I> {
    pub fn new(installer: I) -> Self {
        Self { installer }
    }

    /// Make sure `venv` is provisioned from `request`.
    ///
    /// Only a marked venv is accepted without locking: the marker is the
    /// last thing a provisioning run writes. Anything else, including an
    /// unmarked venv that may be mid-creation, takes the provisioning lock
    /// and re-reads state, since another instance may have finished while
    /// this one waited.
    pub async fn ensure(&self, venv: &Venv, request: &InstallRequest) -> BootResult<Outcome> {
        if let ProvisionState::Provisioned {
            marker: Some(marker),
        } = venv.state().await?
        {
            return Ok(self.already_provisioned(venv, Some(marker), request));
        }

        if let Some(parent) = venv.path().parent() {
            ensure_dir(parent).await?;
        }
        let _lock = ProvisionLock::acquire(&venv.lock_path()).await?;

        match venv.state().await? {
            ProvisionState::Provisioned { marker } => {
                debug!("{} was provisioned while waiting for the lock", venv);
                return Ok(self.already_provisioned(venv, marker, request));
            }
            ProvisionState::Partial => {
                warn!("Discarding partially provisioned environment at {}", venv);
                remove_dir_if_present(venv).await?;
            }
            ProvisionState::Unprovisioned => {}
        }

        self.provision(venv, request).await
    }

    async fn provision(&self, venv: &Venv, request: &InstallRequest) -> BootResult<Outcome> {
        let sentinel = venv.sentinel_path();
        fs::write(&sentinel, std::process::id().to_string())
            .await
            .map_err(|e| BootError::io(format!("writing {}", sentinel.display()), e))?;

        if let Err(e) = self.build(venv, request).await {
            if e.leaves_partial_state() {
                warn!("Leaving {} for the next start to repair", sentinel.display());
            }
            return Err(e);
        }

        let marker = Marker::for_request(request);
        marker.write(&venv.marker_path()).await?;

        fs::remove_file(&sentinel)
            .await
            .map_err(|e| BootError::io(format!("removing {}", sentinel.display()), e))?;

        info!(
            "Provisioned {} with {} from {}",
            venv,
            self.installer.name(),
            request.source.display()
        );
        Ok(Outcome::Provisioned(marker))
    }

    async fn build(&self, venv: &Venv, request: &InstallRequest) -> BootResult<()> {
        self.installer.create_venv(venv, request).await?;
        self.installer.install(venv, request).await
    }

    fn already_provisioned(
        &self,
        venv: &Venv,
        marker: Option<Marker>,
        request: &InstallRequest,
    ) -> Outcome {
        match marker {
            Some(ref m) if !m.matches(request) => warn!(
                "{} was provisioned by venvboot {} from {} with different settings; using it unchanged",
                venv,
                m.version,
                m.source.display()
            ),
            Some(_) => debug!("{} already provisioned", venv),
            None => info!("Adopting existing environment at {}", venv),
        }
        Outcome::AlreadyProvisioned { marker }
    }
}

async fn remove_dir_if_present(venv: &Venv) -> BootResult<()> {
    match fs::remove_dir_all(venv.path()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BootError::io(format!("removing {}", venv), e)),
    }
}
