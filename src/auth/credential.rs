//! Bearer credential value type.

use sha2::{Digest, Sha256};
use std::fmt;

/// Number of digest bytes kept in a fingerprint (16 hex characters).
const FINGERPRINT_BYTES: usize = 8;

/// A non-empty bearer token.
///
/// `Debug` prints the fingerprint only, so credentials can sit in logged
/// structs without leaking.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    /// Wrap a token. Returns `None` for empty or whitespace-only input,
    /// which the rest of the crate treats as "no credential".
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self { token })
        }
    }

    /// The raw token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Stable short identifier used to tell credentials apart.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.token)
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Fingerprint of a raw token.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
