//! Bounded per-tool conversation ledger.
//!
//! The ledger is one JSON document stored as text under
//! [`StateKey::history`]. A missing, blank or unreadable document reads as an
//! empty history.
//!
//! The load-modify-store cycle in [`ChatHistoryStore::append`] takes no lock
//! across calls. Two chains appending to the same tool at once can lose one
//! of the entries; callers that need strict ordering serialize per tool.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tprovider::{ImageAttachment, Message, TokenUsage};

use crate::backend::StateStore;
use crate::error::MemoryError;
use crate::keys::StateKey;

pub const HISTORY_DOCUMENT_VERSION: u32 = 1;

fn current_version() -> u32 {
    HISTORY_DOCUMENT_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub assistant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub tokens_input: u64,
    #[serde(default)]
    pub tokens_output: u64,
}

impl HistoryEntry {
    pub fn new(
        user: impl Into<String>,
        assistant: impl Into<String>,
        model: impl Into<String>,
        usage: TokenUsage,
    ) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
            image: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
            model: model.into(),
            tokens_input: usage.input_tokens,
            tokens_output: usage.output_tokens,
        }
    }

    pub fn with_image(mut self, image: Option<ImageAttachment>) -> Self {
        self.image = image;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub messages: Vec<HistoryEntry>,
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self {
            version: HISTORY_DOCUMENT_VERSION,
            messages: Vec::new(),
        }
    }
}

impl ChatHistory {
    /// Decodes a stored document. Accepts the text encoding written by
    /// [`ChatHistory::encode`] as well as an inline JSON object.
    pub fn decode(stored: Option<&Value>) -> Result<Self, MemoryError> {
        match stored {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::String(text)) if text.trim().is_empty() => Ok(Self::default()),
            Some(Value::String(text)) => Ok(serde_json::from_str(text)?),
            Some(value @ Value::Object(_)) => Ok(serde_json::from_value(value.clone())?),
            Some(other) => Err(MemoryError::decode(format!(
                "history document must be text or an object, found {other}"
            ))),
        }
    }

    pub fn encode(&self) -> Result<Value, MemoryError> {
        Ok(Value::String(serde_json::to_string(self)?))
    }

    /// Appends and then evicts from the front until at most `max_depth` remain.
    pub fn push_bounded(&mut self, entry: HistoryEntry, max_depth: usize) {
        self.messages.push(entry);
        if self.messages.len() > max_depth {
            let excess = self.messages.len() - max_depth;
            self.messages.drain(..excess);
        }
    }

    /// Expands the ledger into alternating user/assistant messages, oldest first.
    pub fn transcript(&self, include_images: bool) -> Vec<Message> {
        self.messages
            .iter()
            .flat_map(|entry| {
                let image = entry.image.clone().filter(|_| include_images);
                [
                    Message::user(entry.user.clone()).with_image(image),
                    Message::assistant(entry.assistant.clone()),
                ]
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Clone)]
pub struct ChatHistoryStore {
    store: Arc<dyn StateStore>,
}

impl ChatHistoryStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Never fails: read and decode errors are logged and yield an empty history.
    pub async fn load(&self, key: &StateKey) -> ChatHistory {
        let stored = match self.store.get(&key.history()).await {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!(
                    phase = "history",
                    event = "load_failed",
                    key = key.prefix(),
                    error = %error,
                    "history could not be read, continuing without it"
                );
                return ChatHistory::default();
            }
        };

        ChatHistory::decode(stored.as_ref()).unwrap_or_else(|error| {
            tracing::warn!(
                phase = "history",
                event = "decode_failed",
                key = key.prefix(),
                error = %error,
                "history document is malformed, treating it as empty"
            );
            ChatHistory::default()
        })
    }

    /// Returns `false` without touching the store when `max_depth` is zero.
    pub async fn append(
        &self,
        key: &StateKey,
        entry: HistoryEntry,
        max_depth: usize,
    ) -> Result<bool, MemoryError> {
        if max_depth == 0 {
            tracing::debug!(key = key.prefix(), "chat history disabled");
            return Ok(false);
        }

        let mut history = self.load(key).await;
        history.push_bounded(entry, max_depth);
        self.store.set(&key.history(), history.encode()?).await?;
        Ok(true)
    }

    /// Resets the ledger and the observation slots derived from past requests.
    pub async fn clear(&self, key: &StateKey) -> Result<(), MemoryError> {
        self.store
            .set(&key.history(), ChatHistory::default().encode()?)
            .await?;

        for slot in [
            key.response_raw(),
            key.text_response(),
            key.response_error(),
            key.request_body(),
            key.request_state(),
        ] {
            self.store.set(&slot, Value::Null).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tcommon::ToolId;
    use tprovider::Role;

    use super::*;
    use crate::InMemoryStateStore;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry::new(format!("q{n}"), format!("a{n}"), "m", TokenUsage::default())
    }

    #[test]
    fn decode_treats_missing_and_blank_as_empty() {
        assert!(ChatHistory::decode(None).expect("none").is_empty());
        assert!(ChatHistory::decode(Some(&json!(""))).expect("blank").is_empty());
        assert!(
            ChatHistory::decode(Some(&json!("{\"messages\": []}")))
                .expect("legacy")
                .is_empty()
        );
        assert!(ChatHistory::decode(Some(&json!("{not json"))).is_err());
        assert!(ChatHistory::decode(Some(&json!(42))).is_err());
    }

    #[test]
    fn documents_round_trip_in_order() {
        let mut history = ChatHistory::default();
        history.push_bounded(entry(1), 5);
        history.push_bounded(
            entry(2).with_image(Some(ImageAttachment::new("image/png", "AAAA"))),
            5,
        );

        let encoded = history.encode().expect("encode");
        let decoded = ChatHistory::decode(Some(&encoded)).expect("decode");
        assert_eq!(decoded, history);
        assert_eq!(decoded.messages[1].image.as_ref().map(|i| i.mime_type.as_str()), Some("image/png"));
    }

    #[test]
    fn entries_without_optional_fields_decode() {
        let stored = json!(r#"{"messages":[{"user":"hi","assistant":"hello","timestamp":1}]}"#);
        let history = ChatHistory::decode(Some(&stored)).expect("decode");
        assert_eq!(history.version, HISTORY_DOCUMENT_VERSION);
        assert_eq!(history.messages[0].tokens_input, 0);
        assert_eq!(history.messages[0].model, "");
    }

    #[test]
    fn transcript_reattaches_images_only_when_asked() {
        let mut history = ChatHistory::default();
        history.push_bounded(
            entry(1).with_image(Some(ImageAttachment::new("image/png", "AAAA"))),
            2,
        );

        let with = history.transcript(true);
        assert_eq!(with.len(), 2);
        assert_eq!(with[0].role, Role::User);
        assert!(with[0].image.is_some());
        assert_eq!(with[1].role, Role::Assistant);
        assert!(history.transcript(false)[0].image.is_none());
    }

    #[tokio::test]
    async fn append_keeps_only_the_most_recent_entries() {
        let store = ChatHistoryStore::new(Arc::new(InMemoryStateStore::new()));
        let key = StateKey::tool(&ToolId::normalize("fifo"));

        for n in 1..=5 {
            assert!(store.append(&key, entry(n), 3).await.expect("append"));
        }

        let history = store.load(&key).await;
        let users = history
            .messages
            .iter()
            .map(|entry| entry.user.as_str())
            .collect::<Vec<_>>();
        assert_eq!(users, ["q3", "q4", "q5"]);
    }

    #[tokio::test]
    async fn zero_depth_never_writes() {
        let backing = Arc::new(InMemoryStateStore::new());
        let store = ChatHistoryStore::new(backing.clone());
        let key = StateKey::tool(&ToolId::normalize("off"));

        assert!(!store.append(&key, entry(1), 0).await.expect("append"));
        assert!(backing.is_empty());
    }

    #[tokio::test]
    async fn malformed_documents_load_as_empty() {
        let backing = Arc::new(InMemoryStateStore::new());
        let key = StateKey::tool(&ToolId::normalize("broken"));
        backing
            .set(&key.history(), json!("{\"messages\": [oops"))
            .await
            .expect("seed");

        let store = ChatHistoryStore::new(backing);
        assert!(store.load(&key).await.is_empty());
        assert!(store.append(&key, entry(1), 2).await.expect("append"));
        assert_eq!(store.load(&key).await.len(), 1);
    }

    #[tokio::test]
    async fn clear_resets_history_and_observations() {
        let backing = Arc::new(InMemoryStateStore::new());
        let key = StateKey::tool(&ToolId::normalize("reset"));
        let store = ChatHistoryStore::new(backing.clone());
        store.append(&key, entry(1), 2).await.expect("append");
        backing
            .set(&key.text_response(), json!("old answer"))
            .await
            .expect("seed");
        backing
            .set(&key.response_error(), json!("old error"))
            .await
            .expect("seed");

        store.clear(&key).await.expect("clear");

        assert!(store.load(&key).await.is_empty());
        assert_eq!(backing.get(&key.text_response()).await.expect("read"), None);
        assert_eq!(backing.get(&key.response_error()).await.expect("read"), None);
        assert_eq!(backing.get(&key.request_state()).await.expect("read"), None);
    }
}
