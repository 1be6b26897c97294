use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tcommon::BoxFuture;

use crate::backend::StateStore;
use crate::error::MemoryError;

/// One JSON file per key under `<root>/state/`, replaced atomically on write.
#[derive(Debug)]
pub struct FilesystemStateStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemStateStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("state")).map_err(|error| {
            MemoryError::storage(format!("failed to create filesystem store root: {error}"))
        })?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root
            .join("state")
            .join(format!("{}.json", hex_encode(key.as_bytes())))
    }

    fn load_value(&self, key: &str) -> Result<Option<Value>, MemoryError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|error| {
            MemoryError::storage(format!("failed to read state file: {error}"))
        })?;
        let value = serde_json::from_slice::<Value>(&bytes).map_err(|error| {
            MemoryError::decode(format!("failed to deserialize state file: {error}"))
        })?;
        Ok(Some(value).filter(|value| !value.is_null()))
    }

    fn save_value(&self, key: &str, value: &Value) -> Result<(), MemoryError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|error| {
            MemoryError::storage(format!("failed to serialize state value: {error}"))
        })?;

        write_atomic(&self.key_path(key), &bytes)
    }
}

impl StateStore for FilesystemStateStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, MemoryError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| MemoryError::storage("filesystem store lock poisoned"))?;
            self.load_value(key)
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| MemoryError::storage("filesystem store lock poisoned"))?;
            self.save_value(key, &value)
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MemoryError> {
    let Some(parent) = path.parent() else {
        return Err(MemoryError::storage("state file missing parent directory"));
    };
    fs::create_dir_all(parent).map_err(|error| {
        MemoryError::storage(format!("failed to create parent directory: {error}"))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        MemoryError::storage(format!("failed to write temporary state file: {error}"))
    })?;

    // rename over an existing file is atomic on unix but fails on windows
    if cfg!(windows) && path.exists() {
        fs::remove_file(path).map_err(|error| {
            MemoryError::storage(format!("failed to replace existing state file: {error}"))
        })?;
    }
    fs::rename(&tmp, path)
        .map_err(|error| MemoryError::storage(format!("failed to finalize state file: {error}")))
}

fn hex_encode(input: &[u8]) -> String {
    input.iter().map(|byte| format!("{byte:02x}")).collect()
}
