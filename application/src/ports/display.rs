//! Port for rendering other participants' replies to the host user.

use conclave_domain::Message;

/// Renders council activity on the display the host user is watching.
pub trait CouncilDisplay: Send + Sync {
    /// Show a reply produced by a non-host participant.
    fn show_reply(&self, msg: &Message);
}

/// No-op implementation for tests and headless runs.
pub struct NoDisplay;

impl CouncilDisplay for NoDisplay {
    fn show_reply(&self, _msg: &Message) {}
}
