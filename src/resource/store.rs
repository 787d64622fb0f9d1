//! The resource store: one remote aggregate, cached and kept in sync with
//! the session credential.
//!
//! A store is built idle. [`ResourceStore::activate`] spawns its driver
//! task, which waits for a credential, performs the initial TTL-checked
//! fetch and then revalidates whenever a new credential appears.
//! [`ResourceStore::deactivate`] ends the activation; nothing is written
//! after it.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::cache::{StaleCache, DEFAULT_FRESHNESS_WINDOW};
use super::cancel::CancelToken;
use super::fetch::{FetchCoordinator, FetchReport, UnwrapFn};
use super::state::{ResourceSnapshot, SharedState};
use crate::auth::{Credential, CredentialService, SessionExpiryHandler};
use crate::config::DashboardConfig;
use crate::credential_watcher::{CredentialChangeWatcher, CredentialGate, GatePolicy, ObservedCredential};
use crate::error::FetchError;
use crate::traits::{HttpClient, Navigator};

/// Deserialize `result.data` straight into `T`.
pub fn decode<T: DeserializeOwned>(data: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(data)
}

/// Describes one remote resource.
///
/// ```ignore
/// let totals = ResourceSpec::<CollectionTotals>::new("totals", "/api/dashboard/totals");
/// ```
#[derive(Debug, Clone)]
pub struct ResourceSpec<T> {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub freshness_window: Duration,
    pub unwrap: UnwrapFn<T>,
}

impl<T: DeserializeOwned> ResourceSpec<T> {
    pub fn new(name: &'static str, endpoint: &'static str) -> Self {
        Self {
            name,
            endpoint,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            unwrap: decode::<T>,
        }
    }
}

impl<T> ResourceSpec<T> {
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_unwrap(mut self, unwrap: UnwrapFn<T>) -> Self {
        self.unwrap = unwrap;
        self
    }
}

/// Collaborators shared by every store of one dashboard.
#[derive(Clone)]
pub struct StoreContext {
    pub http: Arc<dyn HttpClient>,
    pub service: Arc<CredentialService>,
    pub expiry: Arc<SessionExpiryHandler>,
    pub config: Arc<DashboardConfig>,
}

impl StoreContext {
    /// Wire a context; the expiry handler is built here so every store
    /// created from this context shares it.
    pub fn new(
        config: DashboardConfig,
        http: Arc<dyn HttpClient>,
        service: Arc<CredentialService>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let expiry = Arc::new(SessionExpiryHandler::new(
            service.clone(),
            navigator,
            config.sign_in_path.clone(),
        ));
        Self {
            http,
            service,
            expiry,
            config: Arc::new(config),
        }
    }

    pub fn gate_policy(&self) -> GatePolicy {
        self.config.gate
    }
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("config", &self.config)
            .field("service", &self.service)
            .finish()
    }
}

/// Result of [`ResourceStore::refetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new value was stored
    Fetched,
    /// The cached value is still fresh
    Reused,
    /// A fetch was already running
    InFlight,
    /// No credential in storage; nothing was sent
    NoCredential,
    /// The request failed; the error is also on the resource
    Failed(FetchError),
    /// The credential was rejected
    SessionExpired,
    /// The store was deactivated
    Cancelled,
}

impl From<FetchReport> for RefreshOutcome {
    fn from(report: FetchReport) -> Self {
        match report {
            FetchReport::Fetched => RefreshOutcome::Fetched,
            FetchReport::InFlight => RefreshOutcome::InFlight,
            FetchReport::Failed(FetchError::SessionExpired) => RefreshOutcome::SessionExpired,
            FetchReport::Failed(error) => RefreshOutcome::Failed(error),
            FetchReport::Cancelled => RefreshOutcome::Cancelled,
        }
    }
}

struct Inner<T> {
    name: &'static str,
    shared: SharedState<T>,
    cache: StaleCache,
    coordinator: FetchCoordinator<T>,
    service: Arc<CredentialService>,
    gate: GatePolicy,
    recovery_poll: Duration,
    cancel: CancelToken,
    driver: Mutex<Option<JoinHandle<()>>>,
}

/// Cheaply cloneable handle to one resource.
pub struct ResourceStore<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ResourceStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ResourceStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(spec: ResourceSpec<T>, context: &StoreContext) -> Self {
        let coordinator = FetchCoordinator::new(
            spec.name,
            context.config.endpoint_url(spec.endpoint),
            context.http.clone(),
            spec.unwrap,
            context.expiry.clone(),
        );
        Self {
            inner: Arc::new(Inner {
                name: spec.name,
                shared: SharedState::new(),
                cache: StaleCache::new(spec.freshness_window),
                coordinator,
                service: context.service.clone(),
                gate: context.gate_policy(),
                recovery_poll: context.config.recovery_poll_interval,
                cancel: CancelToken::new(),
                driver: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn url(&self) -> &str {
        self.inner.coordinator.url()
    }

    /// Start the driver task. Calling it again while active does nothing;
    /// a deactivated store stays inactive.
    pub fn activate(&self) {
        if self.inner.cancel.is_cancelled() {
            tracing::warn!(resource = self.inner.name, "Store was deactivated, not activating");
            return;
        }
        let mut driver = self.inner.driver.lock().unwrap_or_else(PoisonError::into_inner);
        if driver.is_some() {
            return;
        }
        tracing::debug!(resource = self.inner.name, "Activating");
        let inner = Arc::clone(&self.inner);
        *driver = Some(tokio::spawn(async move { inner.drive().await }));
    }

    pub fn is_active(&self) -> bool {
        let driver = self.inner.driver.lock().unwrap_or_else(PoisonError::into_inner);
        driver.as_ref().is_some_and(|handle| !handle.is_finished()) && !self.inner.cancel.is_cancelled()
    }

    /// Revalidate now. `force` bypasses the freshness window.
    pub async fn refetch(&self, force: bool) -> RefreshOutcome {
        if self.inner.cancel.is_cancelled() {
            return RefreshOutcome::Cancelled;
        }
        match self.inner.service.current().await {
            Some(credential) => self.inner.revalidate(&credential, force).await,
            None => {
                tracing::debug!(resource = self.inner.name, "No credential, skipping refetch");
                self.inner.shared.update(|s| s.skip_without_credential());
                RefreshOutcome::NoCredential
            }
        }
    }

    /// Clear the error and session-expired flags without fetching.
    pub fn clear_error(&self) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        self.inner.shared.update(|s| s.clear_error());
    }

    pub fn snapshot(&self) -> ResourceSnapshot<T> {
        self.inner.shared.snapshot()
    }

    /// Receiver updated after every state change.
    pub fn watch(&self) -> watch::Receiver<ResourceSnapshot<T>> {
        self.inner.shared.subscribe()
    }

    /// End the activation: pending requests are dropped and late
    /// completions write nothing.
    pub fn deactivate(&self) {
        self.inner.cancel.cancel();
        let handle = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        tracing::debug!(resource = self.inner.name, "Deactivated");
    }
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn drive(&self) {
        // Subscribe before waiting so a sign-in during the wait is not lost.
        let mut watcher = CredentialChangeWatcher::new(self.service.clone(), self.recovery_poll);

        self.shared.update(|s| s.begin_awaiting());
        let gate = CredentialGate::new(self.service.clone(), self.gate);
        let credential = match gate.await_credential().await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(resource = self.name, "{}", e);
                self.shared.update(|s| s.mark_unauthenticated());
                return;
            }
        };

        let outcome = self.revalidate(&credential, false).await;
        if outcome == RefreshOutcome::Reused {
            self.shared.observe(credential.fingerprint());
        }
        tracing::debug!(resource = self.name, ?outcome, "Initial load done");

        loop {
            let credential = watcher.next_change(&self.shared).await;
            if self.cancel.is_cancelled() {
                return;
            }
            let report = self.coordinator.fetch(&self.shared, &credential, &self.cancel).await;
            tracing::debug!(resource = self.name, ?report, "Revalidated after credential change");
        }
    }

    async fn revalidate(&self, credential: &Credential, force: bool) -> RefreshOutcome {
        let last_fetch_at = self.shared.read(|s| s.last_fetch_at());
        if !self.cache.should_fetch(last_fetch_at, Instant::now(), force) {
            tracing::trace!(resource = self.name, "Cached value still fresh");
            self.shared.update(|s| s.reuse_cached());
            return RefreshOutcome::Reused;
        }
        self.coordinator
            .fetch(&self.shared, credential, &self.cancel)
            .await
            .into()
    }
}

impl<T: Clone + Send + Sync> ObservedCredential for SharedState<T> {
    fn last_observed(&self) -> Option<String> {
        self.read(|s| s.last_observed_credential().map(str::to_string))
    }

    fn is_session_expired(&self) -> bool {
        self.read(|s| s.is_session_expired())
    }

    fn observe(&self, fingerprint: String) {
        self.update(|s| s.observe_credential(fingerprint));
    }

    fn forget(&self) {
        self.update(|s| s.forget_credential());
    }
}
