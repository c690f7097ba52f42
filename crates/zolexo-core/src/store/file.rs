use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use super::{KeyValueStore, StoreError};

/// Key-value store persisted as a single JSON object.
///
/// Every `set` rewrites the whole file through a temporary sibling and a
/// rename, so a crash mid-write leaves the previous contents intact.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling written before the rename into place
    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents)
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let contents = serde_json::to_string_pretty(map)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await?;
        debug!(key, path = %self.path.display(), "Stored value");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        // An interrupted write can leave the previous values in the tmp file
        for path in [self.tmp_path(), self.path.clone()] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(self.io_error(e)),
            }
        }
        debug!(path = %self.path.display(), "Storage cleared");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileStore {
        FileStore::new(dir.path().join("nested").join("storage.json"))
    }

    #[tokio::test]
    async fn test_get_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.get("Token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_creates_parent_dirs_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("Token", "abc123").await.unwrap();

        // A fresh handle on the same path sees the value
        let reopened = store_in(&dir);
        assert_eq!(reopened.get("Token").await.unwrap().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_set_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("Token", "abc123").await.unwrap();
        store.set("theme", "dark").await.unwrap();
        store.set("Token", "def456").await.unwrap();

        assert_eq!(store.get("Token").await.unwrap().as_deref(), Some("def456"));
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("Token", "abc123").await.unwrap();
        store.set("theme", "dark").await.unwrap();

        store.clear().await.unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.get("Token").await.unwrap(), None);
        assert_eq!(store.get("theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_removes_leftover_tmp_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("Token", "abc123").await.unwrap();

        // Left behind by a write that never reached the rename
        let tmp = store.path().with_extension("json.tmp");
        std::fs::write(&tmp, r#"{"Token":"def456"}"#).unwrap();

        store.clear().await.unwrap();

        assert!(!tmp.exists());
        assert!(!store.path().exists());
        assert_eq!(store.get("Token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_without_file_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.clear().await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get("Token").await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get("Token").await.unwrap(), None);
    }
}
