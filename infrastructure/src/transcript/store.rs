//! Append-only JSONL transcript store.
//!
//! Owns the write end of `discussion.jsonl`. Each append buffers the
//! whole encoded line and lands it with one write followed by a flush, so
//! a tailing reader never observes a torn record: a half-written line has
//! no terminating newline and is simply not delivered yet.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use conclave_application::ports::transcript::{
    TranscriptError, TranscriptReader, TranscriptWriter,
};
use conclave_domain::{codec, tail, Message};
use tracing::debug;

/// The single writer onto a session's transcript file.
///
/// Reads go through freshly opened handles so no file descriptor is ever
/// shared between the writer and a reader.
pub struct JsonlTranscriptStore {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlTranscriptStore {
    /// Open (creating if missing) the transcript at `path` in append
    /// mode. Mode bits restrict the file to the owning user.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptWriter for JsonlTranscriptStore {
    fn append(&self, msg: &Message) -> Result<(), TranscriptError> {
        let line = codec::encode(msg)?;
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl TranscriptReader for JsonlTranscriptStore {
    /// Bulk read through a fresh handle. Only complete lines count; a
    /// trailing partial line and malformed records are skipped.
    fn read_all(&self) -> Result<Vec<Message>, TranscriptError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let (lines, _) = tail::complete_lines(&bytes);
        let mut records = Vec::with_capacity(lines.len());
        for (line, _) in lines {
            match codec::decode(&line) {
                Ok(msg) => records.push(msg),
                Err(e) => debug!(error = %e, "skipping malformed transcript line"),
            }
        }
        Ok(records)
    }
}
