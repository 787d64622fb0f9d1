//! Domain error types.
//!
//! Transport and storage failures are modeled at the trait seams
//! ([`crate::traits::HttpError`], [`crate::traits::StorageError`]); this
//! module holds the errors of the cache itself.
//!
//! | Error | Surfaced as |
//! |-------|-------------|
//! | [`FetchError::SessionExpired`] | `is_session_expired` flag + redirect |
//! | [`FetchError::RequestFailed`] | `error` string, last value kept |
//! | [`FetchError::ServerReported`] | `error` string, last value kept |
//! | [`GateError::NeverAuthenticated`] | `Unauthenticated` phase |
//! | [`ConfigError`] | startup failure |

mod config;
mod fetch;
mod gate;

pub use config::ConfigError;
pub use fetch::{FetchError, FALLBACK_FAILURE_MESSAGE, SERVER_FAILURE_MESSAGE};
pub use gate::GateError;
