//! Host-side mirror of the discussion.
//!
//! The host front-end renders the user's own turns and its own replies
//! natively; this loop tails the transcript and hands only the *other*
//! participants' records to the display, so the host user sees the whole
//! council in one terminal.

use std::sync::Arc;

use conclave_domain::relevance;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::ports::display::CouncilDisplay;
use crate::ports::transcript::TranscriptTail;

/// Tail-and-render loop for the host user's display.
pub struct HostMirror {
    host_id: String,
    tail: Box<dyn TranscriptTail>,
    display: Arc<dyn CouncilDisplay>,
}

impl HostMirror {
    pub fn new(
        host_id: impl Into<String>,
        tail: Box<dyn TranscriptTail>,
        display: Arc<dyn CouncilDisplay>,
    ) -> Self {
        Self {
            host_id: host_id.into(),
            tail,
            display,
        }
    }

    /// Run until cancellation, rendering foreign replies as they land.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(host = %self.host_id, "host mirror started");
        loop {
            let record = tokio::select! {
                _ = cancel.cancelled() => break,
                record = self.tail.next_record() => match record {
                    Some(record) => record,
                    None => break,
                },
            };
            if relevance::wants_host_display(&record, &self.host_id) {
                self.display.show_reply(&record);
            } else {
                debug!(id = %record.id, "not for the host display");
            }
        }
        info!(host = %self.host_id, "host mirror stopped");
    }
}
