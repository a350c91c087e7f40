//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod chat_backend;
pub mod display;
pub mod host_process;
pub mod mirror;
pub mod transcript;
