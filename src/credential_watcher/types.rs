//! Shared types for credential change detection.

use std::path::PathBuf;

use crate::auth::Credential;
use crate::traits::TOKEN_KEY;

/// Where a storage change was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
    /// Written through this process's credential service
    Local,
    /// Reported by another browsing context (tab, window)
    External,
    /// Detected on the shared storage file
    File(PathBuf),
}

impl ChangeSource {
    /// Human-readable description for logging
    pub fn description(&self) -> String {
        match self {
            Self::Local => "local sign-in".to_string(),
            Self::External => "another context".to_string(),
            Self::File(path) => format!("file: {}", path.display()),
        }
    }
}

/// A "storage changed" signal: one key, its new value (`None` when removed).
#[derive(Debug, Clone)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub source: ChangeSource,
    /// When the change was detected
    pub timestamp: tokio::time::Instant,
}

impl StorageEvent {
    pub fn new(key: impl Into<String>, new_value: Option<String>, source: ChangeSource) -> Self {
        Self {
            key: key.into(),
            new_value,
            source,
            timestamp: tokio::time::Instant::now(),
        }
    }

    /// A change of the bearer token key.
    pub fn token(new_value: Option<String>, source: ChangeSource) -> Self {
        Self::new(TOKEN_KEY, new_value, source)
    }

    /// The credential this event carries, if it is a token event with a
    /// non-empty value.
    pub fn credential(&self) -> Option<Credential> {
        if self.key != TOKEN_KEY {
            return None;
        }
        self.new_value.clone().and_then(Credential::new)
    }
}
