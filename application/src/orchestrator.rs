//! Council orchestrator — session lifecycle and graceful shutdown.
//!
//! Startup order matters: the broadcaster drain task comes up before
//! anything can submit, the host mirror before the host itself, and the
//! reactors last. One cancellation token fans out to every task; the host
//! exiting (for any reason) cancels it just like an interrupt does.

use std::path::PathBuf;
use std::sync::Arc;

use conclave_domain::ParticipantId;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::broadcaster::Broadcaster;
use crate::host::HostMirror;
use crate::ports::host_process::{HostError, HostProcess};
use crate::ports::transcript::TranscriptError;
use crate::reactor::{ParticipantReactor, ReactorState, ReactorStatus};

/// Errors that end a council session abnormally.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("transcript writer failed: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("host process failed: {0}")]
    Host(#[from] HostError),
}

/// Copy-out snapshot of a running council.
#[derive(Debug, Clone)]
pub struct CouncilStatus {
    pub session_dir: PathBuf,
    pub participants: Vec<(ParticipantId, ReactorState)>,
    /// Reactors not yet stopped.
    pub running: usize,
}

/// Cloneable observer onto a council; outlives the orchestrator's `run`.
#[derive(Clone)]
pub struct CouncilHandle {
    session_dir: PathBuf,
    statuses: Arc<Vec<ReactorStatus>>,
}

impl CouncilHandle {
    pub fn snapshot(&self) -> CouncilStatus {
        let participants: Vec<(ParticipantId, ReactorState)> = self
            .statuses
            .iter()
            .map(|status| (status.id().clone(), status.state()))
            .collect();
        let running = participants
            .iter()
            .filter(|(_, state)| *state != ReactorState::Stopped)
            .count();
        CouncilStatus {
            session_dir: self.session_dir.clone(),
            participants,
            running,
        }
    }
}

/// Owns every council task for the duration of a session.
pub struct Orchestrator {
    session_dir: PathBuf,
    broadcaster: Broadcaster,
    reactors: Vec<ParticipantReactor>,
    host_mirror: HostMirror,
    host: Box<dyn HostProcess>,
    statuses: Arc<Vec<ReactorStatus>>,
}

impl Orchestrator {
    pub fn new(
        session_dir: impl Into<PathBuf>,
        broadcaster: Broadcaster,
        reactors: Vec<ParticipantReactor>,
        host_mirror: HostMirror,
        host: Box<dyn HostProcess>,
    ) -> Self {
        let statuses = Arc::new(reactors.iter().map(|r| r.status()).collect::<Vec<_>>());
        Self {
            session_dir: session_dir.into(),
            broadcaster,
            reactors,
            host_mirror,
            host,
            statuses,
        }
    }

    /// Observer handle, valid before, during and after `run`.
    pub fn handle(&self) -> CouncilHandle {
        CouncilHandle {
            session_dir: self.session_dir.clone(),
            statuses: Arc::clone(&self.statuses),
        }
    }

    /// Run the council until the host exits or `cancel` fires.
    ///
    /// Returns the process exit code to propagate: 0 for a graceful
    /// shutdown, the host's own code when it exited non-zero. A fatal
    /// transcript error surfaces as `Err` after a best-effort drain.
    pub async fn run(self, cancel: CancellationToken) -> Result<i32, OrchestratorError> {
        let Orchestrator {
            session_dir,
            broadcaster,
            reactors,
            host_mirror,
            mut host,
            ..
        } = self;

        info!(session = %session_dir.display(), participants = reactors.len(), "council starting");

        // The single writer comes up first
        let drain = tokio::spawn(broadcaster.run(cancel.clone()));

        let mut tasks: Vec<JoinHandle<()>> = Vec::new();
        tasks.push(tokio::spawn(host_mirror.run(cancel.clone())));
        for reactor in reactors {
            tasks.push(tokio::spawn(reactor.run(cancel.clone())));
        }

        // Block on the host; its exit ends the session however it happened
        let code = match host.run(cancel.clone()).await {
            Ok(code) => code,
            Err(e) => {
                cancel.cancel();
                for task in tasks {
                    let _ = task.await;
                }
                let _ = drain.await;
                return Err(e.into());
            }
        };

        cancel.cancel();
        for task in tasks {
            let _ = task.await;
        }
        match drain.await {
            Ok(result) => result?,
            Err(e) => error!(error = %e, "broadcaster task panicked"),
        }

        info!(code, "council stopped");
        Ok(code)
    }
}
