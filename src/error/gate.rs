//! Credential gate errors.

use thiserror::Error;

/// The gate stopped waiting for a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Attempt budget exhausted without ever seeing a credential.
    #[error("no credential appeared after {attempts} checks")]
    NeverAuthenticated { attempts: u32 },
}
