//! Filter rules deciding which transcript records demand a response.

use std::collections::HashSet;

use super::entities::{Message, MessageType};

/// Whether `record` requires a response from participant `self_id`.
///
/// A participant never reacts to its own output, whatever the content
/// says. Otherwise it reacts to any human turn, to an explicit `@<id>`
/// mention, and to a directed reply to a message it previously authored —
/// `authored` is the set of message ids this participant has published.
pub fn requires_response(record: &Message, self_id: &str, authored: &HashSet<String>) -> bool {
    if record.from == self_id {
        return false;
    }
    if record.kind == MessageType::User {
        return true;
    }
    if record.is_mentioned(self_id) {
        return true;
    }
    match &record.reply_to {
        Some(target) => authored.contains(target),
        None => false,
    }
}

/// Whether `record` should be rendered on the host user's display.
///
/// The inverse of the reactor filter: only other participants' non-user
/// records are mirrored. The host front-end already shows the user's own
/// turns and the host's replies natively.
pub fn wants_host_display(record: &Message, host_id: &str) -> bool {
    record.from != host_id && record.kind != MessageType::User
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_authored() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn reacts_to_any_user_turn() {
        let msg = Message::user("hello everyone");
        assert!(requires_response(&msg, "claude", &no_authored()));
        assert!(requires_response(&msg, "gpt", &no_authored()));
    }

    #[test]
    fn never_reacts_to_own_output() {
        // Even a self-mention does not override rule one
        let msg = Message::assistant("claude", "@claude again");
        assert!(!requires_response(&msg, "claude", &no_authored()));
    }

    #[test]
    fn reacts_to_explicit_mention_only() {
        let msg = Message::assistant("host", "@claude what do you think?");
        assert!(requires_response(&msg, "claude", &no_authored()));
        assert!(!requires_response(&msg, "gpt", &no_authored()));
    }

    #[test]
    fn reply_must_target_own_message() {
        let mut authored = HashSet::new();
        authored.insert("m42".to_string());

        let reply = Message::assistant("host", "good point").in_reply_to("m42");
        assert!(requires_response(&reply, "claude", &authored));

        // A reply to someone else's message is not a trigger
        let other = Message::assistant("host", "good point").in_reply_to("m99");
        assert!(!requires_response(&other, "claude", &authored));
    }

    #[test]
    fn host_display_drops_user_turns_and_host_output() {
        assert!(!wants_host_display(&Message::user("hi"), "host"));
        assert!(!wants_host_display(&Message::assistant("host", "mine"), "host"));
        assert!(wants_host_display(&Message::assistant("claude", "theirs"), "host"));
        assert!(wants_host_display(&Message::system("claude", "note"), "host"));
    }
}
