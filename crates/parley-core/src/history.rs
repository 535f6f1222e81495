//! In-memory conversation history.
//!
//! One append-only log per [`ConversationKey`], created lazily on first
//! append and kept for the process lifetime. There is no retention or
//! eviction policy; the store only grows.
//!
//! Reads hand out cloned snapshots, so callers can never mutate a log in
//! place and iteration is immune to concurrent appends. The lock is coarse
//! and held only for the copy; expected load is small and correctness wins
//! over throughput here.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::conversation::ConversationKey;
use crate::envelope::ChatMessage;

/// Append-only message logs keyed by conversation.
#[derive(Default)]
pub struct HistoryStore {
    logs: RwLock<HashMap<ConversationKey, Vec<ChatMessage>>>,
}

impl HistoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the conversation's log, creating the log if this
    /// is the first message for the key.
    pub fn append(&self, key: ConversationKey, message: ChatMessage) {
        let mut logs = self.logs.write();
        logs.entry(key).or_default().push(message);
    }

    /// Snapshot a conversation's log in insertion order.
    ///
    /// Returns an empty vector for keys that have never been used.
    #[must_use]
    pub fn get(&self, key: &ConversationKey) -> Vec<ChatMessage> {
        self.logs.read().get(key).cloned().unwrap_or_default()
    }

    /// Number of messages recorded for a conversation.
    #[must_use]
    pub fn len(&self, key: &ConversationKey) -> usize {
        self.logs.read().get(key).map_or(0, Vec::len)
    }

    /// Whether a conversation has no recorded messages.
    #[must_use]
    pub fn is_empty(&self, key: &ConversationKey) -> bool {
        self.len(key) == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ChatScope;
    use crate::identity::Username;

    fn user(s: &str) -> Username {
        Username::parse(s).unwrap()
    }

    fn msg(from: &str, text: &str) -> ChatMessage {
        ChatMessage {
            scope: ChatScope::Global,
            username: user(from),
            text: text.into(),
            recipient: None,
        }
    }

    #[test]
    fn unused_key_yields_empty_log() {
        let store = HistoryStore::new();
        assert!(store.get(&ConversationKey::Global).is_empty());
        assert!(store.is_empty(&ConversationKey::Global));
    }

    #[test]
    fn append_then_read_preserves_insertion_order() {
        let store = HistoryStore::new();
        for i in 0..10 {
            store.append(ConversationKey::Global, msg("alice", &format!("m{i}")));
        }
        let log = store.get(&ConversationKey::Global);
        assert_eq!(log.len(), 10);
        for (i, m) in log.iter().enumerate() {
            assert_eq!(m.text, format!("m{i}"));
        }
    }

    #[test]
    fn logs_are_isolated_per_key() {
        let store = HistoryStore::new();
        let ab = ConversationKey::pair(user("alice"), user("bob"));
        store.append(ConversationKey::Global, msg("alice", "public"));
        store.append(ab.clone(), msg("alice", "private"));

        assert_eq!(store.len(&ConversationKey::Global), 1);
        assert_eq!(store.len(&ab), 1);
        assert_eq!(store.get(&ConversationKey::Global)[0].text, "public");
        assert_eq!(store.get(&ab)[0].text, "private");
    }

    #[test]
    fn commutative_keys_share_one_log() {
        let store = HistoryStore::new();
        store.append(
            ConversationKey::pair(user("alice"), user("bob")),
            msg("alice", "one"),
        );
        store.append(
            ConversationKey::pair(user("bob"), user("alice")),
            msg("bob", "two"),
        );
        let log = store.get(&ConversationKey::pair(user("alice"), user("bob")));
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].text, "one");
        assert_eq!(log[1].text, "two");
    }

    #[test]
    fn snapshot_is_detached_from_the_store() {
        let store = HistoryStore::new();
        store.append(ConversationKey::Global, msg("alice", "first"));
        let snapshot = store.get(&ConversationKey::Global);
        store.append(ConversationKey::Global, msg("alice", "second"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(&ConversationKey::Global), 2);
    }

    #[test]
    fn concurrent_appends_all_land() {
        use std::sync::Arc;
        let store = Arc::new(HistoryStore::new());
        let mut handles = Vec::new();
        for t in 0..4 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    store.append(ConversationKey::Global, msg("alice", &format!("{t}:{i}")));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(&ConversationKey::Global), 200);
    }
}
