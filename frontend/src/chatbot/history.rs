//! Persisted chat transcript under the `chatHistory` key.

use serde::{Deserialize, Serialize};

use crate::config::CHAT_HISTORY_KEY;
use crate::storage::{load_json, save_json, KeyValueStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Anything that is not `user` was said by the bot.
    #[serde(other)]
    Assistant,
}

impl Role {
    pub fn css_class(self) -> &'static str {
        match self {
            Role::User => "message user-message",
            Role::Assistant => "message bot-message",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The stored transcript, or an empty one when nothing (readable) is stored.
pub fn load_history(store: &impl KeyValueStore) -> Vec<ChatMessage> {
    load_json(store, CHAT_HISTORY_KEY).unwrap_or_default()
}

/// Overwrites the stored transcript with the last `cap` messages.
pub fn save_history(store: &impl KeyValueStore, messages: &[ChatMessage], cap: usize) -> bool {
    let start = messages.len().saturating_sub(cap);
    save_json(store, CHAT_HISTORY_KEY, &messages[start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;

    #[test]
    fn round_trip_keeps_order_and_roles() {
        let store = MemoryStore::default();
        let messages = vec![
            ChatMessage::user("How do I budget?"),
            ChatMessage::assistant("Create a **budget** by tracking income."),
            ChatMessage::user("thanks <3"),
        ];
        assert!(save_history(&store, &messages, 100));
        assert_eq!(load_history(&store), messages);
    }

    #[test]
    fn stored_shape_is_role_and_content() {
        let store = MemoryStore::default();
        save_history(&store, &[ChatMessage::assistant("hi")], 100);
        assert_eq!(
            store.get(CHAT_HISTORY_KEY).as_deref(),
            Some(r#"[{"role":"assistant","content":"hi"}]"#)
        );
    }

    #[test]
    fn history_is_capped_to_most_recent() {
        let store = MemoryStore::default();
        let messages: Vec<ChatMessage> = (0..5).map(|i| ChatMessage::user(i.to_string())).collect();
        save_history(&store, &messages, 2);
        let restored = load_history(&store);
        assert_eq!(restored, vec![ChatMessage::user("3"), ChatMessage::user("4")]);
    }

    #[test]
    fn unreadable_history_is_cleared() {
        let store = MemoryStore::with(&[(CHAT_HISTORY_KEY, "{not json")]);
        assert!(load_history(&store).is_empty());
        assert_eq!(store.get(CHAT_HISTORY_KEY), None);

        let store = MemoryStore::with(&[(CHAT_HISTORY_KEY, r#"{"role":"user"}"#)]);
        assert!(load_history(&store).is_empty());
        assert_eq!(store.get(CHAT_HISTORY_KEY), None);
    }

    #[test]
    fn lenient_entries() {
        let store = MemoryStore::with(&[(CHAT_HISTORY_KEY, r#"[{"role":"bot"},{"role":"user","content":"x"}]"#)]);
        assert_eq!(
            load_history(&store),
            vec![ChatMessage::assistant(""), ChatMessage::user("x")]
        );
    }

    #[test]
    fn failed_write_is_reported_not_raised() {
        let store = MemoryStore::read_only();
        assert!(!save_history(&store, &[ChatMessage::user("hi")], 100));
    }
}
