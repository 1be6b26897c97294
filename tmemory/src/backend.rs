//! State store trait and in-memory implementation.
//!
//! Stores are plain key/value maps of JSON values. Each call is atomic on its
//! own; there are no multi-key transactions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tcommon::BoxFuture;

use crate::backends::sqlite::default_sqlite_path;
use crate::error::MemoryError;

pub use crate::backends::filesystem::FilesystemStateStore;
pub use crate::backends::sqlite::SqliteStateStore;

pub trait StateStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, MemoryError>>;

    /// Writes `value`; writing `Value::Null` keeps the key but clears its value.
    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), MemoryError>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateStoreConfig {
    Sqlite { path: PathBuf },
    Filesystem { root: PathBuf },
    InMemory,
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_state_store(config: StateStoreConfig) -> Result<Arc<dyn StateStore>, MemoryError> {
    match config {
        StateStoreConfig::Sqlite { path } => Ok(Arc::new(SqliteStateStore::new(path)?)),
        StateStoreConfig::Filesystem { root } => Ok(Arc::new(FilesystemStateStore::new(root)?)),
        StateStoreConfig::InMemory => Ok(Arc::new(InMemoryStateStore::new())),
    }
}

pub fn create_default_state_store() -> Result<Arc<dyn StateStore>, MemoryError> {
    create_state_store(StateStoreConfig::default())
}

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    values: Mutex<HashMap<String, Value>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys ever written, including those holding `null`.
    pub fn len(&self) -> usize {
        self.values.lock().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStore for InMemoryStateStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, MemoryError>> {
        Box::pin(async move {
            let values = self
                .values
                .lock()
                .map_err(|_| MemoryError::storage("state store lock poisoned"))?;

            Ok(values.get(key).filter(|value| !value.is_null()).cloned())
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let mut values = self
                .values
                .lock()
                .map_err(|_| MemoryError::storage("state store lock poisoned"))?;

            values.insert(key.to_string(), value);
            Ok(())
        })
    }
}
