//! Configuration errors.

use thiserror::Error;

/// A configuration value could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held something other than the expected number.
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A value parsed but is not usable (zero interval, empty URL).
    #[error("{var} is invalid: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}
