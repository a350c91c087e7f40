//! Polling tail cursor over the transcript.
//!
//! Turns the growing `discussion.jsonl` into a stream of decoded records.
//! State is only a byte offset held across poll ticks: every tick opens
//! the file fresh, stats it, reads past the offset and keeps the complete
//! lines. A file that shrank (session reset) rewinds the cursor to the
//! start; a file that does not exist yet just means another tick of
//! waiting.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use conclave_application::ports::transcript::TranscriptTail;
use conclave_domain::{codec, tail, Message, TailPosition};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Tailing reader with resumable position. One per reactor; never shared.
pub struct PollingCursor {
    path: PathBuf,
    read_pos: TailPosition,
    /// Offset just past the last record handed to the consumer.
    delivered: u64,
    interval: Duration,
    cancel: CancellationToken,
    /// Decoded records paired with the offset just past their line.
    pending: VecDeque<(Message, u64)>,
}

impl PollingCursor {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

    pub fn new(path: impl AsRef<Path>, cancel: CancellationToken) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            read_pos: TailPosition::start(),
            delivered: 0,
            interval: Self::DEFAULT_INTERVAL,
            cancel,
            pending: VecDeque::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Byte offset just past the last delivered record. Feed this to
    /// [`set_position`](Self::set_position) to resume a dropped cursor.
    pub fn position(&self) -> u64 {
        self.delivered
    }

    /// Restore the cursor to a previously recorded offset, discarding
    /// anything read beyond it.
    pub fn set_position(&mut self, offset: u64) {
        self.read_pos = TailPosition::at(offset);
        self.delivered = offset;
        self.pending.clear();
    }

    /// One poll tick: decode any newly completed lines into `pending`.
    fn poll_once(&mut self) -> std::io::Result<()> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            // Not created yet; keep waiting
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        let len = file.metadata()?.len();
        if self.read_pos.observe_len(len) {
            debug!(path = %self.path.display(), "transcript shrank, rewinding cursor");
            self.delivered = 0;
            self.pending.clear();
        }
        if len == self.read_pos.offset() {
            return Ok(());
        }

        let base = self.read_pos.offset();
        file.seek(SeekFrom::Start(base))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let (lines, consumed) = tail::complete_lines(&buf);
        self.read_pos.advance(consumed);
        for (line, end) in lines {
            match codec::decode(&line) {
                Ok(msg) => self.pending.push_back((msg, base + end)),
                Err(e) => debug!(error = %e, "skipping malformed transcript line"),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TranscriptTail for PollingCursor {
    async fn next_record(&mut self) -> Option<Message> {
        loop {
            if let Some((msg, end)) = self.pending.pop_front() {
                self.delivered = end;
                return Some(msg);
            }
            if self.cancel.is_cancelled() {
                return None;
            }
            if let Err(e) = self.poll_once() {
                // Transient: retry on the next tick
                warn!(path = %self.path.display(), error = %e, "cursor read failed, retrying");
            }
            if self.pending.is_empty() {
                tokio::select! {
                    _ = self.cancel.cancelled() => return None,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        }
    }
}
