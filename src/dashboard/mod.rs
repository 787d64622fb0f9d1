//! The admin dashboard: six metric stores sharing one session.
//!
//! All six stores are built from the same [`StoreContext`], so they share
//! the HTTP client, the credential service and, most importantly, the
//! session expiry handler: a rejected credential clears the session and
//! redirects once, however many metrics see the 401.

pub mod metrics;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::resource::{RefreshOutcome, ResourceSnapshot, ResourceSpec, ResourceStore, StoreContext};
pub use metrics::{
    CollectionTotals, LevelRejection, MonthlyCollections, PendingCollections, SupervisorAcceptance,
    ValidationStats,
};

pub struct Dashboard {
    /// Tags this dashboard's log lines and snapshots
    id: Uuid,
    pub totals: ResourceStore<CollectionTotals>,
    pub accepted_by_supervisor: ResourceStore<Vec<SupervisorAcceptance>>,
    pub rejected_by_level: ResourceStore<Vec<LevelRejection>>,
    pub pending: ResourceStore<PendingCollections>,
    pub monthly: ResourceStore<Vec<MonthlyCollections>>,
    pub validation_stats: ResourceStore<ValidationStats>,
}

/// Point-in-time view of every metric.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub dashboard_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub totals: ResourceSnapshot<CollectionTotals>,
    pub accepted_by_supervisor: ResourceSnapshot<Vec<SupervisorAcceptance>>,
    pub rejected_by_level: ResourceSnapshot<Vec<LevelRejection>>,
    pub pending: ResourceSnapshot<PendingCollections>,
    pub monthly: ResourceSnapshot<Vec<MonthlyCollections>>,
    pub validation_stats: ResourceSnapshot<ValidationStats>,
}

impl DashboardSnapshot {
    /// Any metric reports a rejected credential.
    pub fn is_session_expired(&self) -> bool {
        self.totals.is_session_expired
            || self.accepted_by_supervisor.is_session_expired
            || self.rejected_by_level.is_session_expired
            || self.pending.is_session_expired
            || self.monthly.is_session_expired
            || self.validation_stats.is_session_expired
    }

    /// Any metric still loading.
    pub fn is_loading(&self) -> bool {
        self.totals.loading
            || self.accepted_by_supervisor.loading
            || self.rejected_by_level.loading
            || self.pending.loading
            || self.monthly.loading
            || self.validation_stats.loading
    }
}

impl Dashboard {
    pub fn new(context: &StoreContext) -> Self {
        let window = context.config.freshness_window;
        Self {
            id: Uuid::new_v4(),
            totals: ResourceStore::new(
                ResourceSpec::new("totals", metrics::TOTALS_ENDPOINT).with_freshness_window(window),
                context,
            ),
            accepted_by_supervisor: ResourceStore::new(
                ResourceSpec::new("accepted-by-supervisor", metrics::ACCEPTED_BY_SUPERVISOR_ENDPOINT)
                    .with_freshness_window(window),
                context,
            ),
            rejected_by_level: ResourceStore::new(
                ResourceSpec::new("rejected-by-level", metrics::REJECTED_BY_LEVEL_ENDPOINT)
                    .with_freshness_window(window),
                context,
            ),
            pending: ResourceStore::new(
                ResourceSpec::new("pending", metrics::PENDING_ENDPOINT).with_freshness_window(window),
                context,
            ),
            monthly: ResourceStore::new(
                ResourceSpec::new("monthly", metrics::MONTHLY_ENDPOINT).with_freshness_window(window),
                context,
            ),
            validation_stats: ResourceStore::new(
                ResourceSpec::new("validation-stats", metrics::VALIDATION_STATS_ENDPOINT)
                    .with_freshness_window(window),
                context,
            ),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Activate every metric; each runs its own driver task.
    pub fn activate(&self) {
        tracing::info!(dashboard = %self.id, "Activating dashboard");
        self.totals.activate();
        self.accepted_by_supervisor.activate();
        self.rejected_by_level.activate();
        self.pending.activate();
        self.monthly.activate();
        self.validation_stats.activate();
    }

    /// Refetch every metric concurrently.
    pub async fn refresh_all(&self, force: bool) -> Vec<(&'static str, RefreshOutcome)> {
        let (totals, accepted, rejected, pending, monthly, validation) = futures::join!(
            self.totals.refetch(force),
            self.accepted_by_supervisor.refetch(force),
            self.rejected_by_level.refetch(force),
            self.pending.refetch(force),
            self.monthly.refetch(force),
            self.validation_stats.refetch(force),
        );
        vec![
            (self.totals.name(), totals),
            (self.accepted_by_supervisor.name(), accepted),
            (self.rejected_by_level.name(), rejected),
            (self.pending.name(), pending),
            (self.monthly.name(), monthly),
            (self.validation_stats.name(), validation),
        ]
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            dashboard_id: self.id,
            taken_at: Utc::now(),
            totals: self.totals.snapshot(),
            accepted_by_supervisor: self.accepted_by_supervisor.snapshot(),
            rejected_by_level: self.rejected_by_level.snapshot(),
            pending: self.pending.snapshot(),
            monthly: self.monthly.snapshot(),
            validation_stats: self.validation_stats.snapshot(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        self.snapshot().is_session_expired()
    }

    pub fn deactivate(&self) {
        self.totals.deactivate();
        self.accepted_by_supervisor.deactivate();
        self.rejected_by_level.deactivate();
        self.pending.deactivate();
        self.monthly.deactivate();
        self.validation_stats.deactivate();
        tracing::info!(dashboard = %self.id, "Dashboard deactivated");
    }
}
