//! In-memory session storage for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{SessionStorage, StorageError, TOKEN_KEY};

/// In-memory session storage for testing.
///
/// Writes made through [`InMemoryStorage::put`] bypass the credential
/// service entirely, which is how tests simulate another tab writing the
/// shared store without a notification.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    remove_calls: Arc<Mutex<Vec<String>>>,
    read_should_fail: Arc<Mutex<bool>>,
}

impl InMemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a bearer token.
    pub fn with_token(token: &str) -> Self {
        let storage = Self::new();
        storage.put(TOKEN_KEY, token);
        storage
    }

    /// Write a key synchronously.
    pub fn put(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    /// Read a key synchronously.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Every key passed to `remove`, in call order.
    pub fn remove_calls(&self) -> Vec<String> {
        self.remove_calls.lock().unwrap().clone()
    }

    /// How many times `key` was removed.
    pub fn remove_count(&self, key: &str) -> usize {
        self.remove_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.as_str() == key)
            .count()
    }

    /// Configure whether reads should fail.
    pub fn set_read_should_fail(&self, should_fail: bool) {
        *self.read_should_fail.lock().unwrap() = should_fail;
    }
}

#[async_trait]
impl SessionStorage for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if *self.read_should_fail.lock().unwrap() {
            return Err(StorageError::ReadFailed("Mock read failure".to_string()));
        }
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.put(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_calls.lock().unwrap().push(key.to_string());
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
