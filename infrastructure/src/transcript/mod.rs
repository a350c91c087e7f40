//! Transcript adapters: the append-only JSONL store and the polling
//! tail cursor that turns file growth into a record stream.

mod cursor;
mod store;

pub use cursor::PollingCursor;
pub use store::JsonlTranscriptStore;
