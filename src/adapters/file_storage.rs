//! File-based session storage adapter.
//!
//! The whole store is one small JSON object (`{"token": "...", "user": "..."}`)
//! at `~/.tradewatch/session.json`. Several processes may share the file; the
//! credential file watcher turns their writes into storage events.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::traits::{SessionStorage, StorageError};

/// The storage directory name under the home directory.
const STORAGE_DIR: &str = ".tradewatch";

/// The storage file name.
const STORAGE_FILE: &str = "session.json";

type Document = BTreeMap<String, String>;

/// Persistent session storage backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    /// Storage in the default location under the home directory.
    pub fn new() -> Result<Self, StorageError> {
        let home = dirs::home_dir()
            .ok_or_else(|| StorageError::Other("Failed to determine home directory".to_string()))?;
        Ok(Self::in_dir(home.join(STORAGE_DIR)))
    }

    /// Storage file inside the given directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_FILE),
        }
    }

    /// Storage at an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the storage file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> Result<Document, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(StorageError::ReadFailed(e.to_string())),
        };

        if contents.trim().is_empty() {
            return Ok(Document::new());
        }

        match serde_json::from_str(&contents) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Session storage is not valid JSON, treating it as empty: {}",
                    e
                );
                Ok(Document::new())
            }
        }
    }

    fn save_document(&self, doc: &Document) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // Write-then-rename so readers in other processes never see a torn file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StorageError::WriteFailed(e.to_string()))
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load_document()?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut doc = self.load_document()?;
        doc.insert(key.to_string(), value.to_string());
        self.save_document(&doc)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut doc = self.load_document()?;
        if doc.remove(key).is_none() {
            return Ok(());
        }
        self.save_document(&doc)
            .map_err(|e| StorageError::RemoveFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{IDENTITY_KEY, TOKEN_KEY};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::in_dir(temp_dir.path());
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::in_dir(temp_dir.path().join("nested"));

        storage.set(TOKEN_KEY, "abc").await.unwrap();
        storage.set(IDENTITY_KEY, r#"{"name":"ops"}"#).await.unwrap();

        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), Some("abc".to_string()));
        assert_eq!(
            storage.get(IDENTITY_KEY).await.unwrap(),
            Some(r#"{"name":"ops"}"#.to_string())
        );
        assert!(storage.path().exists());
    }

    #[tokio::test]
    async fn test_remove_keeps_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::in_dir(temp_dir.path());

        storage.set(TOKEN_KEY, "abc").await.unwrap();
        storage.set("locale", "fr").await.unwrap();
        storage.remove(TOKEN_KEY).await.unwrap();

        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(storage.get("locale").await.unwrap(), Some("fr".to_string()));
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::in_dir(temp_dir.path());
        assert!(storage.remove(TOKEN_KEY).await.is_ok());
        assert!(!storage.path().exists());
    }

    #[tokio::test]
    async fn test_invalid_json_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::in_dir(temp_dir.path());
        fs::write(storage.path(), "not valid json").unwrap();

        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), None);

        storage.set(TOKEN_KEY, "fresh").await.unwrap();
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), Some("fresh".to_string()));
    }

    #[test]
    fn test_default_location() {
        let storage = FileSessionStorage::new().unwrap();
        assert!(storage.path().ends_with(".tradewatch/session.json"));
    }
}
