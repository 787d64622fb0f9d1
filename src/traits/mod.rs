//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - authenticated GET requests
//! - [`SessionStorage`] - the persistent key-value store holding the session
//! - [`Navigator`] - redirect to the sign-in entry point

pub mod http;
pub mod navigator;
pub mod storage;

pub use http::{Headers, HttpClient, HttpError, Response};
pub use navigator::Navigator;
pub use storage::{SessionStorage, StorageError, IDENTITY_KEY, TOKEN_KEY};
