//! Credential availability and change detection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │  sign_in / 401  │     │  File Watcher   │
//! │ (CredentialSvc) │     │  (notify crate) │
//! └────────┬────────┘     └────────┬────────┘
//!          │                       │
//!          └───────────┬───────────┘
//!                      ▼
//!              ┌───────────────┐
//!              │ StorageEvent  │
//!              │  (broadcast)  │
//!              └───────┬───────┘
//!            ┌─────────┴─────────┐
//!            ▼                   ▼
//!    ┌───────────────┐   ┌───────────────┐
//!    │CredentialGate │   │ChangeWatcher  │
//!    │(100ms, then 1s│   │(+2s recovery  │
//!    │   polling)    │   │  poll)        │
//!    └───────────────┘   └───────────────┘
//! ```
//!
//! The gate runs once per activation, before the first fetch. The change
//! watcher runs for the rest of the activation.
//!
//! # Usage
//!
//! ```rust,ignore
//! let storage = FileSessionStorage::new()?;
//! let service = Arc::new(CredentialService::new(Arc::new(storage.clone())));
//!
//! // Keep the handle alive for as long as changes should be relayed
//! let _file_watcher = spawn_file_watcher(service.clone(), storage.path())?;
//! ```

mod file_watcher;
mod gate;
mod types;
mod watcher;

pub use file_watcher::spawn_file_watcher;
pub use gate::{CredentialGate, GatePolicy, DEFAULT_INITIAL_DELAY, DEFAULT_POLL_INTERVAL};
pub use types::{ChangeSource, StorageEvent};
pub use watcher::{CredentialChangeWatcher, ObservedCredential};
