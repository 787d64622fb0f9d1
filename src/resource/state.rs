//! Per-resource state and its transitions.
//!
//! Every mutation goes through a method here so the invariants hold by
//! construction:
//! - `is_fetching` is set by exactly one caller at a time (single-flight);
//! - `error` and `is_session_expired` are never both set;
//! - `value` and `last_fetch_at` only change on success.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tokio::time::Instant;

/// Where a resource is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourcePhase {
    /// Built but not activated
    Uninitialized,
    /// Activated, waiting for a credential
    AwaitingCredential,
    /// A request is in flight
    Fetching,
    /// Last fetch succeeded
    Fresh,
    /// Last fetch failed with a recoverable error
    Error,
    /// Credential rejected; waiting for a new one
    SessionExpired,
    /// The credential wait gave up
    Unauthenticated,
}

#[derive(Debug)]
pub struct ResourceState<T> {
    value: Option<T>,
    loading: bool,
    is_fetching: bool,
    error: Option<String>,
    last_fetch_at: Option<Instant>,
    fetched_at: Option<DateTime<Utc>>,
    is_session_expired: bool,
    last_observed_credential: Option<String>,
    awaiting_credential: bool,
    unauthenticated: bool,
}

impl<T> ResourceState<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            loading: false,
            is_fetching: false,
            error: None,
            last_fetch_at: None,
            fetched_at: None,
            is_session_expired: false,
            last_observed_credential: None,
            awaiting_credential: false,
            unauthenticated: false,
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_fetch_at(&self) -> Option<Instant> {
        self.last_fetch_at
    }

    pub fn is_session_expired(&self) -> bool {
        self.is_session_expired
    }

    pub fn last_observed_credential(&self) -> Option<&str> {
        self.last_observed_credential.as_deref()
    }

    pub fn phase(&self) -> ResourcePhase {
        if self.is_fetching {
            ResourcePhase::Fetching
        } else if self.is_session_expired {
            ResourcePhase::SessionExpired
        } else if self.error.is_some() {
            ResourcePhase::Error
        } else if self.value.is_some() {
            ResourcePhase::Fresh
        } else if self.unauthenticated {
            ResourcePhase::Unauthenticated
        } else if self.awaiting_credential {
            ResourcePhase::AwaitingCredential
        } else {
            ResourcePhase::Uninitialized
        }
    }

    pub(crate) fn begin_awaiting(&mut self) {
        self.awaiting_credential = true;
        self.unauthenticated = false;
        self.loading = self.value.is_none();
    }

    pub(crate) fn mark_unauthenticated(&mut self) {
        self.awaiting_credential = false;
        self.unauthenticated = true;
        self.loading = false;
    }

    /// Claim the single in-flight slot. Returns `false` if a fetch is
    /// already running; the caller must then not issue a request.
    pub(crate) fn begin_fetch(&mut self, fingerprint: String) -> bool {
        if self.is_fetching {
            return false;
        }
        self.is_fetching = true;
        self.loading = true;
        self.error = None;
        self.is_session_expired = false;
        self.awaiting_credential = false;
        self.last_observed_credential = Some(fingerprint);
        true
    }

    pub(crate) fn record_success(&mut self, value: T, now: Instant, wall: DateTime<Utc>) {
        self.value = Some(value);
        self.last_fetch_at = Some(now);
        self.fetched_at = Some(wall);
        self.error = None;
        self.is_session_expired = false;
    }

    pub(crate) fn record_failure(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.is_session_expired = false;
    }

    pub(crate) fn record_session_expired(&mut self) {
        self.is_session_expired = true;
        self.error = None;
        // The credential is gone; any later one counts as new.
        self.last_observed_credential = None;
    }

    pub(crate) fn finish_fetch(&mut self) {
        self.is_fetching = false;
        self.loading = false;
    }

    /// Cached value reused without a request.
    pub(crate) fn reuse_cached(&mut self) {
        self.loading = false;
    }

    /// Nothing to fetch with: no credential in storage.
    pub(crate) fn skip_without_credential(&mut self) {
        if !self.is_fetching {
            self.loading = false;
        }
    }

    /// A new credential was seen outside a fetch.
    pub(crate) fn observe_credential(&mut self, fingerprint: String) {
        self.last_observed_credential = Some(fingerprint);
        self.clear_error();
    }

    pub(crate) fn forget_credential(&mut self) {
        self.last_observed_credential = None;
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
        self.is_session_expired = false;
    }
}

impl<T: Clone> ResourceState<T> {
    pub fn snapshot(&self) -> ResourceSnapshot<T> {
        ResourceSnapshot {
            value: self.value.clone(),
            loading: self.loading,
            error: self.error.clone(),
            is_session_expired: self.is_session_expired,
            last_fetch_at: self.last_fetch_at,
            fetched_at: self.fetched_at,
            phase: self.phase(),
        }
    }
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// What consumers see of a resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSnapshot<T> {
    pub value: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub is_session_expired: bool,
    /// Monotonic time of the last success; drives staleness.
    #[serde(skip)]
    pub last_fetch_at: Option<Instant>,
    /// Wall-clock time of the last success, for display.
    pub fetched_at: Option<DateTime<Utc>>,
    pub phase: ResourcePhase,
}

/// State behind a lock plus a channel publishing a snapshot after every
/// change. The lock is never held across an await.
#[derive(Debug)]
pub struct SharedState<T> {
    state: Mutex<ResourceState<T>>,
    snapshots: watch::Sender<ResourceSnapshot<T>>,
}

impl<T: Clone> SharedState<T> {
    pub fn new() -> Self {
        let state = ResourceState::new();
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            state: Mutex::new(state),
            snapshots,
        }
    }

    /// Mutate the state and publish the result.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ResourceState<T>) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let result = f(&mut state);
            (result, state.snapshot())
        };
        self.snapshots.send_replace(snapshot);
        result
    }

    pub fn read<R>(&self, f: impl FnOnce(&ResourceState<T>) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    pub fn snapshot(&self) -> ResourceSnapshot<T> {
        self.read(ResourceState::snapshot)
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceSnapshot<T>> {
        self.snapshots.subscribe()
    }
}

impl<T: Clone> Default for SharedState<T> {
    fn default() -> Self {
        Self::new()
    }
}
