//! Transcript store ports
//!
//! The transcript is the single source of truth for a session. Writing
//! goes through exactly one append-only writer; reading is either a bulk
//! read (context assembly) or a tailing stream of newly appended records.

use async_trait::async_trait;
use conclave_domain::{CodecError, Message};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised by transcript adapters.
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("transcript i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Append a record to the transcript.
///
/// The implementation must land each record as one complete line so a
/// concurrent reader can never observe a torn record.
pub trait TranscriptWriter: Send + Sync {
    fn append(&self, msg: &Message) -> Result<(), TranscriptError>;
}

/// Bulk read of every decodable record, in append order. Records that
/// fail to decode are skipped.
pub trait TranscriptReader: Send + Sync {
    fn read_all(&self) -> Result<Vec<Message>, TranscriptError>;
}

/// Tailing stream of records appended after the reader's position.
#[async_trait]
pub trait TranscriptTail: Send + Sync {
    /// Wait for the next complete record. Returns `None` once the session
    /// is cancelled or the stream is exhausted for good.
    async fn next_record(&mut self) -> Option<Message>;
}

/// In-memory transcript for tests: append order is the vector order.
#[derive(Default)]
pub struct MemoryTranscript {
    records: Mutex<Vec<Message>>,
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Message> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TranscriptWriter for MemoryTranscript {
    fn append(&self, msg: &Message) -> Result<(), TranscriptError> {
        match self.records.lock() {
            Ok(mut records) => records.push(msg.clone()),
            Err(poisoned) => poisoned.into_inner().push(msg.clone()),
        }
        Ok(())
    }
}

impl TranscriptReader for MemoryTranscript {
    fn read_all(&self) -> Result<Vec<Message>, TranscriptError> {
        Ok(self.records())
    }
}

/// In-memory tail fed by a channel, for tests and embedding.
pub struct ChannelTail {
    rx: mpsc::Receiver<Message>,
}

impl ChannelTail {
    pub fn new(rx: mpsc::Receiver<Message>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl TranscriptTail for ChannelTail {
    async fn next_record(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}
