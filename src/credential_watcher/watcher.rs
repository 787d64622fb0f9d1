//! Credential change detection for one resource.
//!
//! Two triggers feed the same decision:
//! 1. storage events published on the [`CredentialService`];
//! 2. a recovery poll of the store, active only while the resource is
//!    session-expired, for writes that never produced an event.
//!
//! A credential the service already rejected is never returned. One whose
//! fingerprint matches the one the resource last observed is a duplicate
//! unless the resource is expired. Anything else
//! is recorded on the resource and returned so the caller can force a
//! fetch with it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, MissedTickBehavior};

use super::types::StorageEvent;
use crate::auth::{Credential, CredentialService};
use crate::traits::TOKEN_KEY;

/// The resource-side view the watcher needs.
pub trait ObservedCredential: Send + Sync {
    /// Fingerprint of the last credential fetched with or observed.
    fn last_observed(&self) -> Option<String>;

    fn is_session_expired(&self) -> bool;

    /// Record a new credential and clear error flags.
    fn observe(&self, fingerprint: String);

    /// No credential in storage any more.
    fn forget(&self);
}

pub struct CredentialChangeWatcher {
    service: Arc<CredentialService>,
    events: broadcast::Receiver<StorageEvent>,
    events_open: bool,
    recovery_poll: Duration,
}

impl CredentialChangeWatcher {
    /// Subscribe now; events published from here on are seen by
    /// [`CredentialChangeWatcher::next_change`].
    pub fn new(service: Arc<CredentialService>, recovery_poll: Duration) -> Self {
        let events = service.subscribe();
        Self {
            service,
            events,
            events_open: true,
            recovery_poll,
        }
    }

    /// Wait for a credential the resource has not fetched with yet.
    pub async fn next_change(&mut self, resource: &dyn ObservedCredential) -> Credential {
        let mut poll = tokio::time::interval_at(Instant::now() + self.recovery_poll, self.recovery_poll);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = self.events.recv(), if self.events_open => match event {
                    Ok(event) => {
                        if let Some(credential) = self.on_event(&event, resource) {
                            return credential;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Storage events lagged, re-reading store");
                        if let Some(credential) = self.check_store(resource).await {
                            return credential;
                        }
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Storage event channel closed, polling only");
                        self.events_open = false;
                    }
                },
                _ = poll.tick() => {
                    if resource.is_session_expired() {
                        if let Some(credential) = self.check_store(resource).await {
                            tracing::info!("Recovery poll found a new credential");
                            return credential;
                        }
                    }
                }
            }
        }
    }

    fn on_event(&self, event: &StorageEvent, resource: &dyn ObservedCredential) -> Option<Credential> {
        if event.key != TOKEN_KEY {
            return None;
        }
        match event.credential() {
            Some(credential) => self.accept(credential, resource),
            None => {
                resource.forget();
                None
            }
        }
    }

    async fn check_store(&self, resource: &dyn ObservedCredential) -> Option<Credential> {
        match self.service.current().await {
            Some(credential) => self.accept(credential, resource),
            None => {
                resource.forget();
                None
            }
        }
    }

    fn accept(&self, credential: Credential, resource: &dyn ObservedCredential) -> Option<Credential> {
        let fingerprint = credential.fingerprint();
        if self.service.is_rejected(&fingerprint) {
            tracing::trace!(%fingerprint, "Credential was already rejected, ignoring");
            return None;
        }
        if resource.last_observed().as_deref() == Some(fingerprint.as_str())
            && !resource.is_session_expired()
        {
            tracing::trace!(%fingerprint, "Credential unchanged, ignoring");
            return None;
        }

        tracing::info!(%fingerprint, "New credential observed");
        resource.observe(fingerprint);
        Some(credential)
    }
}
