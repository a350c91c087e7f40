//! Council messages: the record entity, its on-disk codec, and the
//! relevance rules deciding who has to answer what.

pub mod codec;
pub mod entities;
pub mod relevance;

pub use entities::{Message, MessageType};
