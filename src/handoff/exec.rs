//! Process image replacement

use crate::config::HandoffMode;
use crate::error::{BootError, BootResult};
use async_trait::async_trait;
use tracing::info;

use super::{Invocation, Launcher};

/// Replaces the current process with the runner.
///
/// No supervisor stays resident, so the orchestrator's signals and the
/// runner's exit status reach each other directly.
pub struct ExecLauncher;

#[async_trait]
impl Launcher for ExecLauncher {
    #[cfg(unix)]
    async fn launch(&self, invocation: Invocation) -> BootResult<i32> {
        use std::os::unix::process::CommandExt;

        info!(
            "Handing off to {} {:?}",
            invocation.program.display(),
            invocation.args
        );

        // Only returns if execve failed.
        let err = std::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .exec();

        Err(match err.kind() {
            std::io::ErrorKind::NotFound => BootError::RunnerNotFound(invocation.program),
            _ => BootError::Handoff {
                program: invocation.program,
                source: err,
            },
        })
    }

    #[cfg(not(unix))]
    async fn launch(&self, invocation: Invocation) -> BootResult<i32> {
        tracing::warn!("Process replacement is unavailable on this platform, supervising instead");
        super::SuperviseLauncher.launch(invocation).await
    }

    fn mode(&self) -> HandoffMode {
        HandoffMode::Exec
    }
}
