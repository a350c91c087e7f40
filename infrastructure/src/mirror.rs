//! JSONL mirror writer for a participant's own outbound messages.
//!
//! Advisory only: creation and write failures are logged and swallowed.
//! The shared transcript remains authoritative, so a broken mirror never
//! costs a reply.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use conclave_application::ports::mirror::MirrorWriter;
use conclave_domain::{codec, Message};
use tracing::warn;

/// Mirror log writing one JSON line per recorded message.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on every record and
/// on `Drop`.
pub struct JsonlMirror {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlMirror {
    /// Open the mirror at `path` in append mode, creating it if missing.
    ///
    /// Returns `None` (with a warning) when the file cannot be opened;
    /// callers fall back to a no-op mirror.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = match options.open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open mirror log");
                return None;
            }
        };
        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MirrorWriter for JsonlMirror {
    fn record(&self, msg: &Message) {
        let line = match codec::encode(msg) {
            Ok(line) => line,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "mirror encode failed");
                return;
            }
        };
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writer.write_all(line.as_bytes()) {
            warn!(path = %self.path.display(), error = %e, "mirror write failed");
            return;
        }
        if let Err(e) = writer.flush() {
            warn!(path = %self.path.display(), error = %e, "mirror flush failed");
        }
    }
}

impl Drop for JsonlMirror {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_land_as_decodable_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claude.jsonl");
        let mirror = JsonlMirror::open(&path).unwrap();

        let first = Message::assistant("claude", "one");
        let second = Message::assistant("claude", "two");
        mirror.record(&first);
        mirror.record(&second);
        drop(mirror);

        let content = std::fs::read_to_string(&path).unwrap();
        let decoded: Vec<Message> = content
            .lines()
            .map(|line| codec::decode(line).unwrap())
            .collect();
        assert_eq!(decoded, vec![first, second]);
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claude.jsonl");

        let mirror = JsonlMirror::open(&path).unwrap();
        mirror.record(&Message::assistant("claude", "before"));
        drop(mirror);

        let mirror = JsonlMirror::open(&path).unwrap();
        mirror.record(&Message::assistant("claude", "after"));
        drop(mirror);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn unopenable_path_yields_none() {
        let result = JsonlMirror::open("/nonexistent/deeply/nested/claude.jsonl");
        assert!(result.is_none());
    }
}
