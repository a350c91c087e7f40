//! Host front-end child process adapter.
//!
//! Spawns the user-supplied interactive command wired to the controlling
//! terminal, with the session directory as its working directory. The
//! host is expected to append its own turns to the transcript through the
//! shared codec; everything else in the session treats it as opaque.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use conclave_application::ports::host_process::{HostError, HostProcess};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Settings file the host picks up when present in the session directory.
const HOST_HOOK_SETTINGS: &str = "claude_hooks.json";

/// Supervised host command.
pub struct HostCommand {
    program: String,
    args: Vec<String>,
    session_dir: PathBuf,
}

impl HostCommand {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        session_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            session_dir: session_dir.into(),
        }
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        let hook_settings = self.session_dir.join(HOST_HOOK_SETTINGS);
        if hook_settings.exists() {
            cmd.arg("--settings").arg(&hook_settings);
        }
        cmd.current_dir(&self.session_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl HostProcess for HostCommand {
    async fn run(&mut self, cancel: CancellationToken) -> Result<i32, HostError> {
        info!(command = %self.program, "starting host front-end");
        let mut child = self.build().spawn().map_err(HostError::Spawn)?;

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("session cancelled, stopping host process");
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "failed to signal host process");
                }
                let _ = child.wait().await;
                Ok(0)
            }
            status = child.wait() => {
                let status = status?;
                // Killed by a signal counts as a user-driven stop
                let code = status.code().unwrap_or(0);
                info!(code, "host front-end exited");
                Ok(code)
            }
        }
    }
}
