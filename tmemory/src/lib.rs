//! Persistent state for toolbox tools and models.
//!
//! Everything is stored through a [`StateStore`], a flat map of JSON values
//! addressed by dotted keys built with [`StateKey`]. On top of it sit the
//! bounded [`ChatHistoryStore`], the cumulative [`StatisticsTracker`] and the
//! [`ObservationStore`] for last-request slots.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tcommon::ToolId;
//! use tmemory::{ChatHistoryStore, HistoryEntry, InMemoryStateStore, StateKey};
//! use tprovider::TokenUsage;
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! runtime.block_on(async {
//!     let history = ChatHistoryStore::new(Arc::new(InMemoryStateStore::new()));
//!     let key = StateKey::tool(&ToolId::normalize("weather"));
//!     let entry = HistoryEntry::new("hi", "hello", "gpt-4o", TokenUsage::default());
//!
//!     history.append(&key, entry, 2).await.unwrap();
//!     assert_eq!(history.load(&key).await.len(), 1);
//! });
//! ```

mod backend;
mod backends;
mod error;
mod history;
mod keys;
mod observations;
mod statistics;

pub mod prelude {
    pub use crate::{
        ChatHistory, ChatHistoryStore, HistoryEntry, InMemoryStateStore, MemoryError,
        MemoryErrorKind, ObservationStore, StateKey, StateStore, StateStoreConfig,
        StatisticsTracker, UsageStatistics, create_state_store,
    };
}

pub use backend::{
    FilesystemStateStore, InMemoryStateStore, SqliteStateStore, StateStore, StateStoreConfig,
    create_default_state_store, create_state_store,
};
pub use error::{MemoryError, MemoryErrorKind};
pub use history::{ChatHistory, ChatHistoryStore, HISTORY_DOCUMENT_VERSION, HistoryEntry};
pub use keys::StateKey;
pub use observations::ObservationStore;
pub use statistics::{StatisticsTracker, UsageStatistics};

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{StateStoreConfig, create_state_store};

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let unique = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("tmemory-{prefix}-{unique}"))
    }

    #[tokio::test]
    async fn every_configured_backend_treats_null_as_cleared() {
        let root = temp_dir("backends");
        let configs = [
            StateStoreConfig::InMemory,
            StateStoreConfig::Filesystem {
                root: root.join("fs"),
            },
            StateStoreConfig::Sqlite {
                path: root.join("state.sqlite3"),
            },
        ];

        for config in configs {
            let store = create_state_store(config.clone()).expect("store should open");
            store
                .set("weather.text_response", json!("sunny"))
                .await
                .expect("write should work");
            assert_eq!(
                store
                    .get("weather.text_response")
                    .await
                    .expect("read should work"),
                Some(json!("sunny")),
                "{config:?}"
            );

            store
                .set("weather.text_response", serde_json::Value::Null)
                .await
                .expect("clear should work");
            assert_eq!(
                store
                    .get("weather.text_response")
                    .await
                    .expect("read should work"),
                None,
                "{config:?}"
            );
        }

        std::fs::remove_dir_all(&root).expect("temporary directory should be removable");
    }

    #[test]
    fn store_config_deserializes_from_tagged_json() {
        let config: StateStoreConfig =
            serde_json::from_value(json!({"kind": "filesystem", "root": "/tmp/state"}))
                .expect("config should parse");
        assert_eq!(
            config,
            StateStoreConfig::Filesystem {
                root: "/tmp/state".into()
            }
        );
    }
}
