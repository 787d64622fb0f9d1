//! Time-to-live freshness check.

use std::time::Duration;
use tokio::time::Instant;

/// Default freshness window (30 seconds).
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(30);

/// Single-entry TTL cache policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleCache {
    freshness_window: Duration,
}

impl StaleCache {
    pub fn new(freshness_window: Duration) -> Self {
        Self { freshness_window }
    }

    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    /// Whether a caller must hit the network.
    pub fn should_fetch(&self, last_fetch_at: Option<Instant>, now: Instant, force: bool) -> bool {
        if force {
            return true;
        }
        match last_fetch_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.freshness_window,
        }
    }
}

impl Default for StaleCache {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW)
    }
}
