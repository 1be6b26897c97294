use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tcommon::BoxFuture;

use crate::backend::StateStore;
use crate::error::MemoryError;

#[derive(Debug)]
pub struct SqliteStateStore {
    connection: Mutex<Connection>,
}

impl SqliteStateStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                MemoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            MemoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, MemoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            MemoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, MemoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                MemoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let store = Self {
            connection: Mutex::new(connection),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, MemoryError> {
        self.connection
            .lock()
            .map_err(|_| MemoryError::storage("sqlite store lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), MemoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS state_values (
                key TEXT PRIMARY KEY,
                value_json TEXT NOT NULL,
                updated_at_millis INTEGER NOT NULL
            );
            ",
        )
        .map_err(|error| MemoryError::storage(format!("failed to initialize sqlite schema: {error}")))
    }
}

impl StateStore for SqliteStateStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let raw = conn
                .query_row(
                    "SELECT value_json FROM state_values WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|error| {
                    MemoryError::storage(format!("failed to read state value: {error}"))
                })?;

            let Some(raw) = raw else {
                return Ok(None);
            };
            let value = serde_json::from_str::<Value>(&raw).map_err(|error| {
                MemoryError::decode(format!("failed to deserialize state value: {error}"))
            })?;
            Ok(Some(value).filter(|value| !value.is_null()))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO state_values (key, value_json, updated_at_millis)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value_json = excluded.value_json,
                    updated_at_millis = excluded.updated_at_millis
                ",
                params![key, value.to_string(), now_millis()],
            )
            .map_err(|error| MemoryError::storage(format!("failed to write state value: {error}")))?;
            Ok(())
        })
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or_default()
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("TOOLBOX_STATE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".toolbox").join("state.sqlite3");
    }

    PathBuf::from("toolbox-state.sqlite3")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn upsert_replaces_previous_value() {
        let store = SqliteStateStore::new_in_memory().expect("store should open");

        store.set("k", json!(1)).await.expect("first write");
        store.set("k", json!({"n": 2})).await.expect("second write");
        assert_eq!(store.get("k").await.expect("read"), Some(json!({"n": 2})));

        store.set("k", Value::Null).await.expect("clear");
        assert_eq!(store.get("k").await.expect("read"), None);
        assert_eq!(store.get("missing").await.expect("read"), None);
    }
}
