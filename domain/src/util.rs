//! Shared utility functions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQ: AtomicU64 = AtomicU64::new(0);

/// Mint a v4-shaped message id.
///
/// The high word folds a process-wide counter into the wall clock
/// (multiplied by an odd constant, so consecutive counts land far
/// apart), which keeps ids distinct even when several reactors mint
/// within the same clock tick. The low word is the raw nanosecond
/// clock.
pub fn uuid_v4() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    let hi = (now.as_nanos() >> 64) as u64 ^ seq.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    let lo = now.as_nanos() as u64;
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (hi >> 32) as u32,
        (hi >> 16) as u16,
        hi as u16 & 0x0fff,
        ((lo >> 48) as u16 & 0x3fff) | 0x8000,
        lo & 0xffff_ffff_ffff
    )
}

/// Truncate a string to approximately `max_bytes` without splitting a
/// UTF-8 character boundary.
///
/// Returns a sub-slice of the original string. If the string is shorter
/// than `max_bytes`, the entire string is returned unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_shape() {
        let id = uuid_v4();
        assert_eq!(id.len(), 36);
        assert_eq!(id.matches('-').count(), 4);
    }

    #[test]
    fn uuids_do_not_collide_in_a_tight_loop() {
        let ids: HashSet<String> = (0..1000).map(|_| uuid_v4()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        let s = "あのね"; // 9 bytes: 3+3+3
        assert_eq!(truncate_str(s, 4), "あ");
        assert_eq!(truncate_str(s, 6), "あの");
    }
}
