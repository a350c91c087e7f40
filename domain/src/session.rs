//! Session directory layout.
//!
//! A session is a directory holding the authoritative transcript and the
//! advisory per-participant mirror logs. Files inside a session are only
//! ever appended to, never rewritten.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// File name of the authoritative transcript inside a session directory.
pub const TRANSCRIPT_FILE: &str = "discussion.jsonl";

/// Directory name reused when resuming the previous discussion.
pub const LIVE_SESSION: &str = "live";

/// Paths inside a single council session directory (Value Object).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLayout {
    root: PathBuf,
}

impl SessionLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The shared transcript, single source of truth for the session.
    pub fn transcript_path(&self) -> PathBuf {
        self.root.join(TRANSCRIPT_FILE)
    }

    /// Advisory mirror of one participant's own outbound messages.
    pub fn mirror_path(&self, participant_id: &str) -> PathBuf {
        self.root.join(format!("{}.jsonl", participant_id))
    }
}

/// Name for a fresh session directory, derived from the wall clock.
pub fn session_dir_name(now: DateTime<Local>) -> String {
    format!("session-{}", now.format("%Y%m%d-%H%M%S"))
}
