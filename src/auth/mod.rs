//! Session and credential management.
//!
//! - [`Credential`] - bearer token with a log-safe fingerprint
//! - [`CredentialService`] - single writer / many subscribers for the session keys
//! - [`SessionExpiryHandler`] - one clear + one redirect per rejected credential

pub mod credential;
pub mod expiry;
pub mod service;

pub use credential::{fingerprint, Credential};
pub use expiry::SessionExpiryHandler;
pub use service::CredentialService;
