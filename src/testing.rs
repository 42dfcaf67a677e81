//! Test doubles for the installer and launcher seams

use crate::config::HandoffMode;
use crate::error::{BootError, BootResult};
use crate::handoff::{Invocation, Launcher};
use crate::provision::{InstallRequest, Installer, Venv};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records calls; creates the venv directory but installs nothing
#[derive(Clone, Default)]
pub struct FakeInstaller {
    calls: Arc<Mutex<Vec<&'static str>>>,
    fail_install: bool,
    delay: Duration,
}

impl FakeInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Venv creation succeeds, installation fails
    pub fn failing() -> Self {
        Self {
            fail_install: true,
            ..Self::default()
        }
    }

    /// Pause after creating the venv directory and before installing, so
    /// concurrent callers see a half-built venv
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Installer for FakeInstaller {
    async fn create_venv(&self, venv: &Venv, _request: &InstallRequest) -> BootResult<()> {
        self.calls.lock().unwrap().push("venv");
        std::fs::create_dir_all(venv.bin_dir()).map_err(|e| BootError::io("fake venv", e))?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }

    async fn install(&self, venv: &Venv, request: &InstallRequest) -> BootResult<()> {
        self.calls.lock().unwrap().push("install");
        if self.fail_install {
            return Err(BootError::Install {
                source_path: request.source.clone(),
                venv: venv.path().to_path_buf(),
                stderr: "simulated failure".to_string(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Records invocations instead of starting anything
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    invocations: Arc<Mutex<Vec<Invocation>>>,
    exit_code: i32,
}

impl RecordingLauncher {
    pub fn new(exit_code: i32) -> Self {
        Self {
            invocations: Arc::default(),
            exit_code,
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Launcher for RecordingLauncher {
    async fn launch(&self, invocation: Invocation) -> BootResult<i32> {
        self.invocations.lock().unwrap().push(invocation);
        Ok(self.exit_code)
    }

    fn mode(&self) -> HandoffMode {
        HandoffMode::Supervise
    }
}
