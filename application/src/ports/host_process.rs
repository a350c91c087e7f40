//! Port for the externally supplied host front-end process.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors raised by the host process adapter.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("failed to spawn host command: {0}")]
    Spawn(std::io::Error),

    #[error("host process i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// The interactive host child process.
///
/// `run` blocks until the host exits on its own or `cancel` fires,
/// returning the process exit code (0 when terminated by cancellation).
/// The host drives the user dialogue through its own stdio; it is
/// expected to append its turns to the transcript through the shared
/// codec.
#[async_trait]
pub trait HostProcess: Send {
    async fn run(&mut self, cancel: CancellationToken) -> Result<i32, HostError>;
}
