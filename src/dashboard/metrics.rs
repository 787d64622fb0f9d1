//! Payloads of the six dashboard metrics.
//!
//! Each is the `result.data` of its endpoint, deserialized as-is.

use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoints
// ============================================================================

pub const TOTALS_ENDPOINT: &str = "/api/dashboard/totals";
pub const ACCEPTED_BY_SUPERVISOR_ENDPOINT: &str = "/api/dashboard/accepted-by-supervisor";
pub const REJECTED_BY_LEVEL_ENDPOINT: &str = "/api/dashboard/rejected-by-level";
pub const PENDING_ENDPOINT: &str = "/api/dashboard/pending";
pub const MONTHLY_ENDPOINT: &str = "/api/dashboard/monthly";
pub const VALIDATION_STATS_ENDPOINT: &str = "/api/dashboard/validation-stats";

// ============================================================================
// Collection counts
// ============================================================================

/// Total number of collections recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CollectionTotals {
    #[serde(default)]
    pub total: u64,
}

/// Collections still waiting for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PendingCollections {
    #[serde(default)]
    pub pending: u64,
}

/// Collections recorded in one month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCollections {
    pub month: String,
    #[serde(default)]
    pub total: u64,
}

// ============================================================================
// Validation
// ============================================================================

/// Collections accepted by one supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorAcceptance {
    pub supervisor_id: u64,
    pub supervisor: String,
    #[serde(default)]
    pub accepted: u64,
}

/// Collections rejected at one validation level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRejection {
    pub level: String,
    #[serde(default)]
    pub rejected: u64,
}

/// Outcome counts across all validation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationStats {
    #[serde(default)]
    pub validated: u64,
    #[serde(default)]
    pub rejected: u64,
    #[serde(default)]
    pub pending: u64,
}

impl ValidationStats {
    /// Collections that reached a decision.
    pub fn decided(&self) -> u64 {
        self.validated + self.rejected
    }

    /// Share of decided collections that were accepted, in `0.0..=1.0`.
    /// `None` before any decision.
    pub fn acceptance_rate(&self) -> Option<f64> {
        match self.decided() {
            0 => None,
            decided => Some(self.validated as f64 / decided as f64),
        }
    }
}

/// Sum of rejections over all levels.
pub fn total_rejections(levels: &[LevelRejection]) -> u64 {
    levels.iter().map(|l| l.rejected).sum()
}

/// Sum of acceptances over all supervisors.
pub fn total_acceptances(supervisors: &[SupervisorAcceptance]) -> u64 {
    supervisors.iter().map(|s| s.accepted).sum()
}
