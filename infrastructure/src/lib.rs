//! Infrastructure layer for conclave
//!
//! This crate contains the adapters that implement the ports defined in
//! the application layer: the JSONL transcript store and its polling
//! tail cursor, per-participant mirror logs, HTTP chat backends, the
//! host child process, session directory management and configuration
//! loading.

pub mod backends;
pub mod config;
pub mod host;
pub mod mirror;
pub mod session;
pub mod transcript;

// Re-export commonly used types
pub use backends::{build_backend, AnthropicBackend, BackendBuildError, OpenAiBackend};
pub use config::{
    builtin_presets, config_sources, describe_sources, load_config, merge_presets, preset_by_id,
    ConfigSource, FileConfig, FileDefaultsConfig, FileHostConfig, FileModelConfig,
    FileSystemConfig,
};
pub use host::HostCommand;
pub use mirror::JsonlMirror;
pub use session::create_session_dir;
pub use transcript::{JsonlTranscriptStore, PollingCursor};
