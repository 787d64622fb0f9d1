//! Dashboard configuration.
//!
//! Built with [`DashboardConfig::default`] plus `with_*` builders, or read
//! from `TRADEWATCH_*` environment variables.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use tradewatch::config::DashboardConfig;
//!
//! let config = DashboardConfig::default()
//!     .with_api_url("https://admin.example.com")
//!     .with_freshness_window(Duration::from_secs(60));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::credential_watcher::GatePolicy;
use crate::error::ConfigError;
use crate::resource::DEFAULT_FRESHNESS_WINDOW;

pub const API_URL_VAR: &str = "TRADEWATCH_API_URL";
pub const FRESHNESS_VAR: &str = "TRADEWATCH_FRESHNESS_MS";
pub const GATE_INITIAL_VAR: &str = "TRADEWATCH_GATE_INITIAL_MS";
pub const GATE_INTERVAL_VAR: &str = "TRADEWATCH_GATE_INTERVAL_MS";
pub const GATE_MAX_ATTEMPTS_VAR: &str = "TRADEWATCH_GATE_MAX_ATTEMPTS";
pub const RECOVERY_POLL_VAR: &str = "TRADEWATCH_RECOVERY_POLL_MS";
pub const SIGN_IN_PATH_VAR: &str = "TRADEWATCH_SIGN_IN_PATH";
pub const STORAGE_DIR_VAR: &str = "TRADEWATCH_STORAGE_DIR";
pub const REQUEST_TIMEOUT_VAR: &str = "TRADEWATCH_REQUEST_TIMEOUT_MS";

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default sign-in entry point.
pub const DEFAULT_SIGN_IN_PATH: &str = "/sign-in";

/// Default interval of the recovery poll while a session is expired.
pub const DEFAULT_RECOVERY_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Base URL; endpoints are appended to it
    pub api_url: String,
    /// How long a fetched value counts as fresh (default: 30s)
    pub freshness_window: Duration,
    /// Credential wait timing and budget
    pub gate: GatePolicy,
    /// Store re-read interval while the session is expired (default: 2s)
    pub recovery_poll_interval: Duration,
    /// Where the navigator is sent on session expiry
    pub sign_in_path: String,
    /// Directory of the session file (default: `~/.tradewatch`)
    pub storage_dir: Option<PathBuf>,
    /// Per-request timeout; none when unset
    pub request_timeout: Option<Duration>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            gate: GatePolicy::default(),
            recovery_poll_interval: DEFAULT_RECOVERY_POLL_INTERVAL,
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            storage_dir: None,
            request_timeout: None,
        }
    }
}

impl DashboardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL. A trailing slash is dropped.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_gate(mut self, gate: GatePolicy) -> Self {
        self.gate = gate;
        self
    }

    /// Bound the credential wait to `attempts` checks.
    pub fn with_max_gate_attempts(mut self, attempts: u32) -> Self {
        self.gate.max_attempts = Some(attempts);
        self
    }

    pub fn with_recovery_poll_interval(mut self, interval: Duration) -> Self {
        self.recovery_poll_interval = interval;
        self
    }

    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Full URL of an endpoint path.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_url, endpoint.trim_start_matches('/'))
    }

    /// Read the configuration from the environment. Unset variables keep
    /// their defaults; malformed numbers are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = env_string(API_URL_VAR) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    var: API_URL_VAR,
                    reason: format!("expected an http(s) URL, got '{}'", url),
                });
            }
            config = config.with_api_url(url);
        }
        if let Some(ms) = env_millis(FRESHNESS_VAR)? {
            config.freshness_window = ms;
        }
        if let Some(ms) = env_millis(GATE_INITIAL_VAR)? {
            config.gate.initial_delay = ms;
        }
        if let Some(ms) = env_millis(GATE_INTERVAL_VAR)? {
            config.gate.poll_interval = ms;
        }
        if let Some(attempts) = env_number(GATE_MAX_ATTEMPTS_VAR)? {
            if attempts == 0 {
                return Err(ConfigError::InvalidValue {
                    var: GATE_MAX_ATTEMPTS_VAR,
                    reason: "must be at least 1".to_string(),
                });
            }
            config.gate.max_attempts = Some(u32::try_from(attempts).unwrap_or(u32::MAX));
        }
        if let Some(ms) = env_millis(RECOVERY_POLL_VAR)? {
            config.recovery_poll_interval = ms;
        }
        if let Some(path) = env_string(SIGN_IN_PATH_VAR) {
            config.sign_in_path = path;
        }
        if let Some(dir) = env_string(STORAGE_DIR_VAR) {
            config.storage_dir = Some(PathBuf::from(dir));
        }
        if let Some(ms) = env_millis(REQUEST_TIMEOUT_VAR)? {
            config.request_timeout = Some(ms);
        }

        Ok(config)
    }
}

fn env_string(var: &'static str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_number(var: &'static str) -> Result<Option<u64>, ConfigError> {
    let Some(value) = env_string(var) else {
        return Ok(None);
    };
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|source| ConfigError::InvalidNumber { var, value, source })
}

fn env_millis(var: &'static str) -> Result<Option<Duration>, ConfigError> {
    Ok(env_number(var)?.map(Duration::from_millis))
}
