//! Bootstrap sequencer
//!
//! Ensures the cache directory, provisions the venv when the strategy
//! calls for it, then hands off to the runner. Every failure before the
//! handoff aborts startup; the runner is never started against a venv
//! that failed to provision.

use crate::config::{Config, Strategy};
use crate::error::BootResult;
use crate::handoff::{Invocation, Launcher};
use crate::layout::Layout;
use crate::provision::{InstallRequest, Installer, Outcome, Provisioner};
use tracing::{debug, info};

/// Result of everything that happens before the handoff
#[derive(Debug)]
pub struct Prepared {
    /// `None` when the strategy skips provisioning at start
    pub outcome: Option<Outcome>,
    pub invocation: Invocation,
}

/// One bootstrap run over a resolved configuration
pub struct Bootstrap<I> {
    config: Config,
    layout: Layout,
    provisioner: Provisioner<I>,
}

impl<I: Installer> Bootstrap<I> {
    pub fn new(config: Config, installer: I) -> Self {
        let layout = Layout::from_config(&config);
        Self {
            config,
            layout,
            provisioner: Provisioner::new(installer),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Install inputs for this run
    pub fn install_request(&self) -> InstallRequest {
        let cache_dir = match self.config.bootstrap.strategy {
            Strategy::Lazy => Some(self.layout.cache_dir.clone()),
            // At image-build time there is no project volume to cache into.
            Strategy::Eager => Some(self.layout.cache_dir.clone())
                .filter(|_| self.config.project.cache.is_absolute()),
        };

        InstallRequest {
            source: self.config.install.source.clone(),
            python: self.config.install.python.clone(),
            link_mode: self.config.install.link_mode.clone(),
            cache_dir,
        }
    }

    /// Ensure the cache, provision if lazy, and resolve the runner
    pub async fn prepare(&self) -> BootResult<Prepared> {
        debug!("Bootstrap layout: {:?}", self.layout);

        self.layout.check_project_dir().await?;
        self.layout.ensure_cache_dir().await?;

        let outcome = match self.config.bootstrap.strategy {
            Strategy::Lazy => Some(
                self.provisioner
                    .ensure(&self.layout.venv, &self.install_request())
                    .await?,
            ),
            Strategy::Eager => {
                debug!(
                    "Eager strategy: using image environment {}",
                    self.layout.venv
                );
                None
            }
        };

        let invocation = Invocation::for_runner(&self.config, &self.layout)?;
        Ok(Prepared {
            outcome,
            invocation,
        })
    }

    /// Prepare, then hand off. With an exec launcher this only returns on
    /// failure.
    pub async fn run(&self, launcher: &dyn Launcher) -> BootResult<i32> {
        let prepared = self.prepare().await?;
        info!(
            "Bootstrap complete ({} strategy, {} handoff)",
            self.config.bootstrap.strategy,
            launcher.mode()
        );
        launcher.launch(prepared.invocation).await
    }

    /// Provision the image-baked venv. Run once while building the image,
    /// never per start.
    pub async fn build(&self) -> BootResult<Outcome> {
        self.provisioner
            .ensure(&self.layout.venv, &self.install_request())
            .await
    }
}
