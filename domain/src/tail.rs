//! Cursor position arithmetic for tailing the transcript.
//!
//! The I/O loop that polls the transcript owns a [`TailPosition`] per
//! reader and feeds it observed file sizes and consumed byte counts; the
//! line-splitting itself is pure and lives in [`complete_lines`].

/// Byte position of a tailing reader over an append-only file (Value
/// Object). Never shared between readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TailPosition {
    offset: u64,
}

impl TailPosition {
    /// A cursor at the beginning of the file.
    pub fn start() -> Self {
        Self { offset: 0 }
    }

    /// A cursor restored to a previously recorded offset.
    pub fn at(offset: u64) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Observe the current file size. Returns `true` when the file shrank
    /// below the cursor (truncated or rotated), in which case the position
    /// rewinds to the beginning. Appends never shrink the file, so this
    /// only fires after a session reset.
    pub fn observe_len(&mut self, len: u64) -> bool {
        if len < self.offset {
            self.offset = 0;
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self, bytes: u64) {
        self.offset += bytes;
    }
}

/// Split a freshly read byte region into complete `\n`-terminated lines.
///
/// Returns each complete line paired with the offset just past its
/// terminating newline (relative to the buffer start), plus the total
/// bytes consumed. Blank lines consume bytes but are not returned. A
/// trailing partial line consumes nothing; it is reconsidered once more
/// bytes arrive.
pub fn complete_lines(buf: &[u8]) -> (Vec<(String, u64)>, u64) {
    let mut lines = Vec::new();
    let mut consumed = 0u64;
    let mut start = 0usize;
    for (i, byte) in buf.iter().enumerate() {
        if *byte != b'\n' {
            continue;
        }
        let raw = String::from_utf8_lossy(&buf[start..i]);
        let line = raw.trim_end_matches('\r');
        let end = (i + 1) as u64;
        if !line.trim().is_empty() {
            lines.push((line.to_string(), end));
        }
        consumed = end;
        start = i + 1;
    }
    (lines, consumed)
}
