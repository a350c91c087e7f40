//! Participant reactor — the per-participant observe → filter → respond
//! loop.
//!
//! Each reactor owns its identity, a chat backend, a tailing view of the
//! transcript, a private mirror writer and a send-only broadcast handle.
//! Records arrive in transcript order and at most one backend call is in
//! flight, so a participant's replies come out in the order their
//! triggers were seen.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use conclave_domain::{history_from_transcript, relevance, Message, ParticipantId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broadcaster::BroadcastHandle;
use crate::ports::chat_backend::{BackendError, ChatBackend};
use crate::ports::mirror::MirrorWriter;
use crate::ports::transcript::{TranscriptReader, TranscriptTail};

/// Lifecycle state of a reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactorState {
    Idle,
    Thinking,
    Publishing,
    Errored,
    Stopped,
}

/// Shared, copy-out view of a reactor's state machine.
///
/// The owning reactor task is the only writer; observers read a copy of
/// the value under a short-held lock. `suspend` parks the reactor in
/// `Idle`: records still stream past its cursor but none triggers a
/// response until `resume`.
#[derive(Clone)]
pub struct ReactorStatus {
    id: ParticipantId,
    state: Arc<Mutex<ReactorState>>,
    suspended: Arc<AtomicBool>,
}

impl ReactorStatus {
    fn new(id: ParticipantId) -> Self {
        Self {
            id,
            state: Arc::new(Mutex::new(ReactorState::Idle)),
            suspended: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn state(&self) -> ReactorState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn suspend(&self) {
        self.suspended.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.suspended.store(false, Ordering::SeqCst);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    fn set(&self, state: ReactorState) {
        match self.state.lock() {
            Ok(mut guard) => *guard = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }
}

/// Tunables for a reactor.
#[derive(Debug, Clone)]
pub struct ReactorConfig {
    /// Deadline for a single backend completion call.
    pub reply_timeout: Duration,
    /// Emit a `system` diagnostic record when the backend fails.
    pub announce_failures: bool,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(60),
            announce_failures: false,
        }
    }
}

/// One reactor per non-host participant.
pub struct ParticipantReactor {
    id: ParticipantId,
    backend: Box<dyn ChatBackend>,
    tail: Box<dyn TranscriptTail>,
    reader: Arc<dyn TranscriptReader>,
    mirror: Arc<dyn MirrorWriter>,
    broadcast: BroadcastHandle,
    config: ReactorConfig,
    status: ReactorStatus,
    /// Ids of the messages this participant has published, for the
    /// directed-reply filter rule.
    authored: HashSet<String>,
}

impl ParticipantReactor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ParticipantId,
        backend: Box<dyn ChatBackend>,
        tail: Box<dyn TranscriptTail>,
        reader: Arc<dyn TranscriptReader>,
        mirror: Arc<dyn MirrorWriter>,
        broadcast: BroadcastHandle,
        config: ReactorConfig,
    ) -> Self {
        let status = ReactorStatus::new(id.clone());
        Self {
            id,
            backend,
            tail,
            reader,
            mirror,
            broadcast,
            config,
            status,
            authored: HashSet::new(),
        }
    }

    /// Observer handle onto this reactor's state machine.
    pub fn status(&self) -> ReactorStatus {
        self.status.clone()
    }

    /// Run until cancellation. Backend failures never end the loop.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(participant = %self.id, "reactor started");
        loop {
            let record = tokio::select! {
                _ = cancel.cancelled() => break,
                record = self.tail.next_record() => match record {
                    Some(record) => record,
                    None => break,
                },
            };
            if self.status.state() == ReactorState::Errored {
                self.status.set(ReactorState::Idle);
            }
            if self.status.is_suspended() {
                debug!(participant = %self.id, trigger = %record.id, "suspended, skipping record");
                continue;
            }
            if !relevance::requires_response(&record, self.id.as_str(), &self.authored) {
                continue;
            }
            self.react(&record).await;
        }
        self.status.set(ReactorState::Stopped);
        info!(participant = %self.id, "reactor stopped");
    }

    async fn react(&mut self, trigger: &Message) {
        debug!(participant = %self.id, trigger = %trigger.id, "reacting");
        self.status.set(ReactorState::Thinking);
        let reply = match self.think(trigger).await {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                self.status.set(ReactorState::Idle);
                return;
            }
            Err(e) => {
                error!(participant = %self.id, trigger = %trigger.id, error = %e, "backend call failed");
                self.status.set(ReactorState::Errored);
                if self.config.announce_failures {
                    let note = Message::system(
                        self.id.as_str(),
                        format!("{} could not reply: {}", self.id, e),
                    )
                    .in_reply_to(trigger.id.clone());
                    if let Err(e) = self.broadcast.submit(note).await {
                        warn!(participant = %self.id, error = %e, "failed to announce backend failure");
                    }
                }
                return;
            }
        };

        self.status.set(ReactorState::Publishing);
        // Mirror first: advisory, never fatal. The broadcast is what counts.
        self.mirror.record(&reply);
        self.authored.insert(reply.id.clone());
        if let Err(e) = self.broadcast.submit(reply).await {
            warn!(participant = %self.id, error = %e, "broadcast submission failed");
        }
        self.status.set(ReactorState::Idle);
    }

    /// Assemble context from the whole transcript and call the backend.
    ///
    /// `Ok(None)` means there was nothing worth sending (the transcript
    /// was unreadable or empty); the reactor simply moves on.
    async fn think(&self, trigger: &Message) -> Result<Option<Message>, BackendError> {
        let records = match self.reader.read_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(participant = %self.id, error = %e, "context read failed");
                return Ok(None);
            }
        };
        if records.is_empty() {
            return Ok(None);
        }
        let history = history_from_transcript(&records, true);

        let deadline = self.config.reply_timeout;
        let content = tokio::time::timeout(deadline, self.backend.complete(&history, deadline))
            .await
            .map_err(|_| BackendError::Timeout)??;
        if content.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(Some(
            Message::assistant(self.id.as_str(), content).in_reply_to(trigger.id.clone()),
        ))
    }
}
