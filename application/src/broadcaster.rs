//! Message broadcaster — the single writer onto the transcript.
//!
//! Reactors and the host adapter submit through a bounded channel; one
//! drain task serializes every append, so the transcript's line order is
//! exactly the submission order. Nothing else in the process holds the
//! write end of the transcript.

use std::sync::Arc;
use std::time::{Duration, Instant};

use conclave_domain::Message;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::ports::transcript::{TranscriptError, TranscriptWriter};

/// What `submit` does when the channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Apply backpressure: the submitter waits for space.
    #[default]
    Block,
    /// Drop the new message and report a warning.
    DropNewest,
}

/// Tunables for the broadcaster.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Capacity of the bounded submission channel.
    pub capacity: usize,
    pub overflow: OverflowPolicy,
    /// How long shutdown may spend flushing already-accepted messages.
    pub drain_deadline: Duration,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            overflow: OverflowPolicy::Block,
            drain_deadline: Duration::from_secs(2),
        }
    }
}

/// Errors surfaced to submitters.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("broadcast channel full, message dropped")]
    ChannelFull,

    #[error("broadcaster is gone")]
    Closed,
}

/// Send-only handle onto the broadcaster's submission channel.
///
/// Handed to each reactor at construction; the broadcaster itself remains
/// the sole owner of the transcript writer.
#[derive(Clone)]
pub struct BroadcastHandle {
    tx: mpsc::Sender<Message>,
    overflow: OverflowPolicy,
}

impl BroadcastHandle {
    /// Submit a message for appending to the transcript.
    ///
    /// Under [`OverflowPolicy::Block`] this waits until the channel has
    /// space; under [`OverflowPolicy::DropNewest`] a full channel loses
    /// the message and returns [`SubmitError::ChannelFull`].
    pub async fn submit(&self, msg: Message) -> Result<(), SubmitError> {
        match self.overflow {
            OverflowPolicy::Block => self.tx.send(msg).await.map_err(|_| SubmitError::Closed),
            OverflowPolicy::DropNewest => match self.tx.try_send(msg) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(dropped)) => {
                    warn!(from = %dropped.from, "broadcast channel full, dropping message");
                    Err(SubmitError::ChannelFull)
                }
                Err(TrySendError::Closed(_)) => Err(SubmitError::Closed),
            },
        }
    }
}

/// The drain half, constructed paired with its [`BroadcastHandle`].
pub struct Broadcaster {
    rx: mpsc::Receiver<Message>,
    store: Arc<dyn TranscriptWriter>,
    drain_deadline: Duration,
}

impl Broadcaster {
    pub fn new(
        store: Arc<dyn TranscriptWriter>,
        config: BroadcasterConfig,
    ) -> (Self, BroadcastHandle) {
        let (tx, rx) = mpsc::channel(config.capacity);
        (
            Self {
                rx,
                store,
                drain_deadline: config.drain_deadline,
            },
            BroadcastHandle {
                tx,
                overflow: config.overflow,
            },
        )
    }

    /// Run the drain loop until cancellation or a fatal transcript error.
    ///
    /// An append failure compromises the single-writer invariant and is
    /// fatal: the token is cancelled so the rest of the session winds
    /// down, and the error is returned to the orchestrator.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), TranscriptError> {
        info!("broadcaster started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(msg) => {
                        if let Err(e) = self.store.append(&msg) {
                            error!(error = %e, "transcript append failed");
                            cancel.cancel();
                            return Err(e);
                        }
                    }
                    None => {
                        debug!("all broadcast handles dropped");
                        info!("broadcaster stopped");
                        return Ok(());
                    }
                },
            }
        }
        let result = self.drain();
        info!("broadcaster stopped");
        result
    }

    /// Flush messages accepted before shutdown, bounded by the drain
    /// deadline.
    fn drain(&mut self) -> Result<(), TranscriptError> {
        let deadline = Instant::now() + self.drain_deadline;
        let mut drained = 0usize;
        while Instant::now() < deadline {
            match self.rx.try_recv() {
                Ok(msg) => {
                    self.store.append(&msg)?;
                    drained += 1;
                }
                Err(_) => break,
            }
        }
        if drained > 0 {
            debug!(drained, "flushed pending messages on shutdown");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::transcript::MemoryTranscript;

    fn store() -> Arc<MemoryTranscript> {
        Arc::new(MemoryTranscript::new())
    }

    #[tokio::test]
    async fn appends_in_submission_order() {
        let store = store();
        let (broadcaster, handle) =
            Broadcaster::new(store.clone(), BroadcasterConfig::default());
        let cancel = CancellationToken::new();
        let drain = tokio::spawn(broadcaster.run(cancel.clone()));

        for i in 0..5 {
            handle.submit(Message::user(format!("m{}", i))).await.unwrap();
        }
        drop(handle);
        drain.await.unwrap().unwrap();

        let contents: Vec<String> = store.records().iter().map(|m| m.content.clone()).collect();
        assert_eq!(contents, vec!["m0", "m1", "m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn backpressure_preserves_submission_order() {
        let store = store();
        let (broadcaster, handle) = Broadcaster::new(
            store.clone(),
            BroadcasterConfig {
                capacity: 1,
                ..Default::default()
            },
        );

        handle.submit(Message::user("first")).await.unwrap();

        let blocked_handle = handle.clone();
        let second = tokio::spawn(async move {
            blocked_handle.submit(Message::user("second")).await
        });

        // Give the blocked submit a moment; it cannot finish yet
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!second.is_finished());

        // Start the drainer; both messages land in submission order
        let cancel = CancellationToken::new();
        let drain = tokio::spawn(broadcaster.run(cancel.clone()));
        second.await.unwrap().unwrap();
        drop(handle);
        drain.await.unwrap().unwrap();

        let contents: Vec<String> = store.records().iter().map(|m| m.content.clone()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn drop_newest_reports_channel_full() {
        let store = store();
        let (_broadcaster, handle) = Broadcaster::new(
            store.clone(),
            BroadcasterConfig {
                capacity: 1,
                overflow: OverflowPolicy::DropNewest,
                ..Default::default()
            },
        );

        handle.submit(Message::user("kept")).await.unwrap();
        let result = handle.submit(Message::user("lost")).await;
        assert!(matches!(result, Err(SubmitError::ChannelFull)));
    }

    #[tokio::test]
    async fn shutdown_drains_accepted_messages() {
        let store = store();
        let (broadcaster, handle) =
            Broadcaster::new(store.clone(), BroadcasterConfig::default());
        let cancel = CancellationToken::new();

        // Accept messages before the drain task ever runs
        handle.submit(Message::user("a")).await.unwrap();
        handle.submit(Message::user("b")).await.unwrap();
        cancel.cancel();

        broadcaster.run(cancel).await.unwrap();
        assert_eq!(store.records().len(), 2);
    }
}
