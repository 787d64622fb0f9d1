//! Common test utilities for integration tests.
//!
//! This module provides a fixture wiring mock storage, HTTP and navigation
//! into a [`StoreContext`], plus helpers for paused-clock assertions.
//!
//! # Example
//!
//! ```ignore
//! let fixture = Fixture::with_token("tok");
//! fixture.http.set_response(&fixture.url(TOTALS), envelope(json!({"total": 1})));
//! let store = fixture.store::<Totals>("totals", TOTALS);
//! ```

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tradewatch::auth::CredentialService;
use tradewatch::config::DashboardConfig;
use tradewatch::resource::{ResourceSnapshot, ResourceSpec, ResourceStore, StoreContext};

/// Base URL used by every fixture.
pub const API_URL: &str = "https://api.test";

/// Mocks plus the context wired on top of them.
pub struct Fixture {
    pub storage: InMemoryStorage,
    pub http: MockHttpClient,
    pub navigator: RecordingNavigator,
    pub service: Arc<CredentialService>,
    pub context: StoreContext,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(InMemoryStorage::new(), test_config())
    }

    pub fn with_token(token: &str) -> Self {
        Self::with_config(InMemoryStorage::with_token(token), test_config())
    }

    pub fn with_config(storage: InMemoryStorage, config: DashboardConfig) -> Self {
        let http = MockHttpClient::new();
        let navigator = RecordingNavigator::new();
        let service = Arc::new(CredentialService::new(Arc::new(storage.clone())));
        let context = StoreContext::new(
            config,
            Arc::new(http.clone()),
            service.clone(),
            Arc::new(navigator.clone()),
        );
        Self {
            storage,
            http,
            navigator,
            service,
            context,
        }
    }

    /// Full URL of an endpoint.
    pub fn url(&self, endpoint: &str) -> String {
        self.context.config.endpoint_url(endpoint)
    }

    pub fn store<T>(&self, name: &'static str, endpoint: &'static str) -> ResourceStore<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        ResourceStore::new(ResourceSpec::new(name, endpoint), &self.context)
    }
}

/// Default configuration pointed at [`API_URL`].
pub fn test_config() -> DashboardConfig {
    DashboardConfig::default().with_api_url(API_URL)
}

/// Wait until a snapshot satisfies `predicate`, failing after `limit` of
/// (paused) time.
pub async fn wait_until<T, F>(store: &ResourceStore<T>, limit: Duration, predicate: F) -> ResourceSnapshot<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&ResourceSnapshot<T>) -> bool,
{
    let mut rx = store.watch();
    let result = tokio::time::timeout(limit, async {
        loop {
            {
                let snapshot = rx.borrow_and_update();
                if predicate(&snapshot) {
                    return (*snapshot).clone();
                }
            }
            if rx.changed().await.is_err() {
                return store.snapshot();
            }
        }
    })
    .await;
    match result {
        Ok(snapshot) => snapshot,
        Err(_) => panic!("condition not reached within {:?}: {:?}", limit, store.snapshot().phase),
    }
}

/// Assert `actual` is `expected` within a few milliseconds.
pub fn assert_near(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(5),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}

/// Time elapsed between `start` and `at`.
pub fn since(start: Instant, at: Option<Instant>) -> Duration {
    at.expect("timestamp recorded").duration_since(start)
}
