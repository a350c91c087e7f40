//! Application layer for conclave
//!
//! This crate contains the long-running council use cases — the
//! broadcaster, the participant reactors, the host mirror and the
//! orchestrator tying them together — plus the port definitions their
//! adapters implement. It depends only on the domain layer.

pub mod broadcaster;
pub mod host;
pub mod orchestrator;
pub mod ports;
pub mod reactor;

// Re-export commonly used types
pub use broadcaster::{
    BroadcastHandle, Broadcaster, BroadcasterConfig, OverflowPolicy, SubmitError,
};
pub use host::HostMirror;
pub use orchestrator::{CouncilHandle, CouncilStatus, Orchestrator, OrchestratorError};
pub use ports::{
    chat_backend::{BackendError, ChatBackend},
    display::CouncilDisplay,
    host_process::{HostError, HostProcess},
    mirror::MirrorWriter,
    transcript::{TranscriptError, TranscriptReader, TranscriptTail, TranscriptWriter},
};
pub use reactor::{ParticipantReactor, ReactorConfig, ReactorState, ReactorStatus};
