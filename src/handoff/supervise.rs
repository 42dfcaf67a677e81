//! Spawn-and-wait handoff with signal forwarding

use crate::config::HandoffMode;
use crate::error::{BootError, BootResult};
use async_trait::async_trait;
use std::process::ExitStatus;
use tokio::process::{Child, Command};
#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, info};

use super::{Invocation, Launcher};

/// Runs the runner as a child, forwarding termination signals and
/// returning its exit code (128 + signal number if it was killed).
pub struct SuperviseLauncher;

#[async_trait]
impl Launcher for SuperviseLauncher {
    async fn launch(&self, invocation: Invocation) -> BootResult<i32> {
        info!(
            "Starting {} {:?} under supervision",
            invocation.program.display(),
            invocation.args
        );

        // Listen before spawning so a signal cannot kill the supervisor and
        // orphan the runner.
        let forwarder = Forwarder::install()?;

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => BootError::RunnerNotFound(invocation.program.clone()),
                _ => BootError::Handoff {
                    program: invocation.program.clone(),
                    source: e,
                },
            })?;

        let status = forwarder.wait(&mut child).await?;
        let code = exit_code(status);
        debug!("Runner exited with {}", code);
        Ok(code)
    }

    fn mode(&self) -> HandoffMode {
        HandoffMode::Supervise
    }
}

/// Termination signals relayed to the runner
#[cfg(unix)]
struct Forwarder {
    term: Signal,
    int: Signal,
    hup: Signal,
    quit: Signal,
}

#[cfg(unix)]
impl Forwarder {
    fn install() -> BootResult<Self> {
        let listen = |kind: SignalKind| {
            signal(kind).map_err(|e| BootError::io("installing signal handler", e))
        };
        Ok(Self {
            term: listen(SignalKind::terminate())?,
            int: listen(SignalKind::interrupt())?,
            hup: listen(SignalKind::hangup())?,
            quit: listen(SignalKind::quit())?,
        })
    }

    async fn wait(mut self, child: &mut Child) -> BootResult<ExitStatus> {
        let pid = child
            .id()
            .ok_or_else(|| BootError::Internal("runner exited before it could be supervised".into()))?
            as libc::pid_t;

        loop {
            let sig = tokio::select! {
                status = child.wait() => {
                    return status.map_err(|e| BootError::io("waiting for runner", e));
                }
                _ = self.term.recv() => libc::SIGTERM,
                _ = self.int.recv() => libc::SIGINT,
                _ = self.hup.recv() => libc::SIGHUP,
                _ = self.quit.recv() => libc::SIGQUIT,
            };

            debug!("Forwarding signal {} to runner (pid {})", sig, pid);
            // SAFETY: kill(2) on a child we spawned and have not yet reaped.
            unsafe {
                libc::kill(pid, sig);
            }
        }
    }
}

#[cfg(not(unix))]
struct Forwarder;

#[cfg(not(unix))]
impl Forwarder {
    fn install() -> BootResult<Self> {
        Ok(Self)
    }

    async fn wait(self, child: &mut Child) -> BootResult<ExitStatus> {
        child
            .wait()
            .await
            .map_err(|e| BootError::io("waiting for runner", e))
    }
}

/// Shell convention: exit code, or 128 + signal for signal deaths
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}
