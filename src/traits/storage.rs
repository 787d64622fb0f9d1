//! Session storage trait abstraction.
//!
//! Models the persistent key-value store shared by every resource and the
//! rest of the application. Only two keys are meaningful to the cache: the
//! bearer credential and the cached identity blob, which are always cleared
//! together.

use async_trait::async_trait;

/// Key holding the bearer credential.
pub const TOKEN_KEY: &str = "token";

/// Key holding the cached identity of the signed-in user.
pub const IDENTITY_KEY: &str = "user";

/// Storage operation errors.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Failed to read a key
    ReadFailed(String),
    /// Failed to write a key
    WriteFailed(String),
    /// Failed to remove a key
    RemoveFailed(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::ReadFailed(msg) => write!(f, "Failed to read session storage: {}", msg),
            StorageError::WriteFailed(msg) => {
                write!(f, "Failed to write session storage: {}", msg)
            }
            StorageError::RemoveFailed(msg) => {
                write!(f, "Failed to remove session key: {}", msg)
            }
            StorageError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Trait for the shared persistent key-value store.
///
/// Writes are last-write-wins; there is no locking across callers.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read a key. `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
