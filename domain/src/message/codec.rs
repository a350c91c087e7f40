//! On-disk JSONL codec for transcript records.
//!
//! One JSON object per line, `\n`-terminated. The codec is the only place
//! that knows a record's serialized shape: unknown fields survive a
//! decode/encode round-trip, lines missing a required field reject.

use thiserror::Error;

use super::entities::Message;

/// Errors produced while encoding or decoding a transcript line.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("empty line")]
    EmptyLine,

    #[error("malformed record: {0}")]
    MalformedRecord(#[from] serde_json::Error),
}

/// Encode a message as a single `\n`-terminated JSON line.
///
/// JSON string escaping guarantees the emitted line contains no embedded
/// newline regardless of the message content.
pub fn encode(msg: &Message) -> Result<String, CodecError> {
    let mut line = serde_json::to_string(msg)?;
    line.push('\n');
    Ok(line)
}

/// Decode one transcript line into a message.
///
/// Rejects empty lines and anything that does not parse as a JSON object
/// carrying at least `id`, `from`, `type` and `content`. A missing
/// `timestamp` is tolerated for forward compatibility.
pub fn decode(line: &str) -> Result<Message, CodecError> {
    let trimmed = line.trim_end_matches(['\n', '\r']);
    if trimmed.trim().is_empty() {
        return Err(CodecError::EmptyLine);
    }
    Ok(serde_json::from_str(trimmed)?)
}
