//! File-backed key/value store for session data.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::traits::BaseSessionStore;

const APP_DIR: &str = "signin";
const STORE_FILE: &str = "session.json";

/// Stores string values under string keys in a single JSON file.
///
/// Unknown keys already present in the file are preserved across writes.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store under the platform-local data directory.
    pub fn new() -> Result<Self> {
        let base = dirs::data_local_dir().context("No local data directory available")?;
        Ok(Self {
            path: base.join(APP_DIR).join(STORE_FILE),
        })
    }

    /// Store at an explicit file path.
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Map<String, Value> {
        if let Ok(data) = fs::read_to_string(&self.path) {
            if let Ok(Value::Object(map)) = serde_json::from_str(&data) {
                return map;
            }
        }
        Map::new()
    }

    fn save(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(entries).context("Failed to encode store file")?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl BaseSessionStore for FileSessionStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load();
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> FileSessionStore {
        let path = std::env::temp_dir()
            .join(format!("signin-store-test-{}", Uuid::new_v4()))
            .join(STORE_FILE);
        FileSessionStore::at_path(path)
    }

    fn cleanup(store: &FileSessionStore) {
        if let Some(parent) = store.path().parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[tokio::test]
    async fn test_put_creates_file_and_round_trips() {
        let store = temp_store();

        store.put("farmerToken", "abc123").await.expect("put should succeed");

        let data = fs::read_to_string(store.path()).expect("store file exists");
        let parsed: Value = serde_json::from_str(&data).expect("valid json");
        assert_eq!(parsed["farmerToken"], "abc123");
        cleanup(&store);
    }

    #[tokio::test]
    async fn test_put_preserves_other_keys() {
        let store = temp_store();

        store.put("farmerToken", "abc123").await.expect("put should succeed");
        store.put("currentFarmer", "{}").await.expect("put should succeed");
        store.put("farmerToken", "def456").await.expect("put should succeed");

        let data = fs::read_to_string(store.path()).expect("store file exists");
        let parsed: Value = serde_json::from_str(&data).expect("valid json");
        assert_eq!(parsed["farmerToken"], "def456");
        assert_eq!(parsed["currentFarmer"], "{}");
        cleanup(&store);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_replaced() {
        let store = temp_store();
        if let Some(parent) = store.path().parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(store.path(), "not json at all").expect("write");

        store.put("farmerToken", "abc123").await.expect("put should succeed");

        let data = fs::read_to_string(store.path()).expect("store file exists");
        let parsed: Value = serde_json::from_str(&data).expect("valid json");
        assert_eq!(parsed["farmerToken"], "abc123");
        cleanup(&store);
    }
}
