//! Publish/subscribe credential service.
//!
//! Single owner of the session keys in [`SessionStorage`]. Writers are the
//! sign-in flow and session expiry; every resource store subscribes to the
//! resulting [`StorageEvent`]s instead of polling the store on its own.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

use super::credential::Credential;
use crate::credential_watcher::{ChangeSource, StorageEvent};
use crate::traits::{SessionStorage, StorageError, IDENTITY_KEY, TOKEN_KEY};

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 32;

/// Shared credential authority.
pub struct CredentialService {
    storage: Arc<dyn SessionStorage>,
    events: broadcast::Sender<StorageEvent>,
    /// Fingerprint of the credential whose rejection was already handled.
    expired: Mutex<Option<String>>,
}

impl CredentialService {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage,
            events,
            expired: Mutex::new(None),
        }
    }

    /// Receive every storage event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// The credential currently in storage.
    ///
    /// A failed read counts as "no credential"; callers treat absence as a
    /// wait state, never as an error.
    pub async fn current(&self) -> Option<Credential> {
        match self.storage.get(TOKEN_KEY).await {
            Ok(token) => token.and_then(Credential::new),
            Err(e) => {
                tracing::warn!("Could not read credential from session storage: {}", e);
                None
            }
        }
    }

    /// Store a fresh session and announce it.
    pub async fn sign_in(
        &self,
        token: &str,
        identity: Option<&serde_json::Value>,
    ) -> Result<(), StorageError> {
        self.storage.set(TOKEN_KEY, token).await?;
        if let Some(identity) = identity {
            self.storage.set(IDENTITY_KEY, &identity.to_string()).await?;
        }
        self.rearm();
        tracing::info!(fingerprint = %super::fingerprint(token), "Signed in");
        self.publish(StorageEvent::token(Some(token.to_string()), ChangeSource::Local));
        Ok(())
    }

    /// Remove the credential and the identity blob together.
    pub async fn clear_session(&self) -> Result<(), StorageError> {
        let token = self.storage.remove(TOKEN_KEY).await;
        let identity = self.storage.remove(IDENTITY_KEY).await;
        self.publish(StorageEvent::token(None, ChangeSource::Local));
        token.and(identity)
    }

    /// Clear the session after `credential` was rejected.
    ///
    /// Returns `true` only for the first rejection of a given credential;
    /// later calls with the same credential do nothing.
    pub async fn invalidate(&self, credential: &Credential) -> bool {
        let fingerprint = credential.fingerprint();
        {
            let mut expired = self.expired.lock().unwrap_or_else(PoisonError::into_inner);
            if expired.as_deref() == Some(fingerprint.as_str()) {
                tracing::debug!(%fingerprint, "Credential already invalidated");
                return false;
            }
            *expired = Some(fingerprint.clone());
        }

        tracing::warn!(%fingerprint, "Credential rejected, clearing session");
        if let Err(e) = self.clear_session().await {
            tracing::warn!("Failed to clear session storage: {}", e);
        }
        true
    }

    /// Relay a change that happened outside this service.
    pub fn notify_external(&self, event: StorageEvent) {
        if event.credential().is_some() {
            self.rearm();
        }
        tracing::debug!(
            key = %event.key,
            source = %event.source.description(),
            present = event.new_value.is_some(),
            "Storage changed"
        );
        self.publish(event);
    }

    /// Whether the credential with this fingerprint was rejected and no
    /// sign-in has happened since.
    pub fn is_rejected(&self, fingerprint: &str) -> bool {
        self.expired.lock().unwrap_or_else(PoisonError::into_inner).as_deref() == Some(fingerprint)
    }

    /// Forget which credential was rejected, so the next rejection is
    /// handled again. Only a sign-in or a relayed credential re-arms.
    fn rearm(&self) {
        *self.expired.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn publish(&self, event: StorageEvent) {
        // No subscribers is fine: nothing is mounted yet.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}
