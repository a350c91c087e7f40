//! Port for per-participant mirror logs.
//!
//! Mirrors duplicate a participant's own outbound messages for debugging
//! and resume inspection. The write is intentionally non-fallible: mirror
//! failures are logged by the adapter and never disturb the discussion —
//! the shared transcript is authoritative.

use conclave_domain::Message;

pub trait MirrorWriter: Send + Sync {
    /// Record one of the owner's outbound messages.
    fn record(&self, msg: &Message);
}

/// No-op implementation for tests and when mirroring is unavailable.
pub struct NoMirror;

impl MirrorWriter for NoMirror {
    fn record(&self, _msg: &Message) {}
}
