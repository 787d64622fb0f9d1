//! Outcome classification for resource fetches.

use thiserror::Error;

/// Message shown when the server answers 2xx but reports `success: false`.
pub const SERVER_FAILURE_MESSAGE: &str = "The server could not provide this data. Please try again.";

/// Message shown when a failure carries no usable detail.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Failed to load data. Please try again.";

/// Why a fetch did not produce a value.
///
/// `SessionExpired` is surfaced as a flag on the resource, the two other
/// variants as its error string; a resource never shows both at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The credential was rejected (HTTP 401).
    #[error("session expired")]
    SessionExpired,

    /// Network, non-2xx status or malformed envelope.
    #[error("{0}")]
    RequestFailed(String),

    /// HTTP success but the envelope says `success: false`.
    #[error("{0}")]
    ServerReported(String),
}

impl FetchError {
    /// Build a request failure from the most specific message available.
    ///
    /// Candidates are tried in order; blank ones are skipped.
    pub fn request_failed<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let message = candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty())
            .unwrap_or(FALLBACK_FAILURE_MESSAGE);
        FetchError::RequestFailed(message.to_string())
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, FetchError::SessionExpired)
    }

    /// The string a resource stores in its `error` field, if any.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            FetchError::SessionExpired => None,
            FetchError::RequestFailed(msg) | FetchError::ServerReported(msg) => Some(msg),
        }
    }

    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::SessionExpired => "FETCH_SESSION_EXPIRED",
            FetchError::RequestFailed(_) => "FETCH_REQUEST_FAILED",
            FetchError::ServerReported(_) => "FETCH_SERVER_REPORTED",
        }
    }
}
