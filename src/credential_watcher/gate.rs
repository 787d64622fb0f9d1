//! Wait for a credential before the first fetch.
//!
//! Checks the store on a fixed schedule (first check after 100ms, then every
//! second) and wakes early when a sign-in is published on the credential
//! service. The attempt budget is optional; unbounded by default.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

use super::types::StorageEvent;
use crate::auth::{Credential, CredentialService};
use crate::error::GateError;

/// Delay before the first check.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Delay between subsequent checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Timing and budget of the credential wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    pub initial_delay: Duration,
    pub poll_interval: Duration,
    /// `None` waits forever.
    pub max_attempts: Option<u32>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

impl GatePolicy {
    /// Whether `attempts` checks use up the budget. An unbounded policy is
    /// never exhausted.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

pub struct CredentialGate {
    service: Arc<CredentialService>,
    policy: GatePolicy,
}

impl CredentialGate {
    pub fn new(service: Arc<CredentialService>, policy: GatePolicy) -> Self {
        Self { service, policy }
    }

    /// Resolve once a credential is available.
    pub async fn await_credential(&self) -> Result<Credential, GateError> {
        let mut events = self.service.subscribe();
        let mut delay = self.policy.initial_delay;
        let mut attempts: u32 = 0;

        loop {
            let announced = tokio::select! {
                _ = tokio::time::sleep(delay) => None,
                event = next_sign_in(&mut events) => event.and_then(|e| e.credential()),
            };

            attempts = attempts.saturating_add(1);

            let found = match announced {
                Some(credential) => Some(credential),
                None => self.service.current().await,
            };

            if let Some(credential) = found {
                tracing::debug!(
                    attempts,
                    fingerprint = %credential.fingerprint(),
                    "Credential available"
                );
                return Ok(credential);
            }

            if self.policy.is_exhausted(attempts) {
                tracing::warn!(attempts, "Gave up waiting for a credential");
                return Err(GateError::NeverAuthenticated { attempts });
            }

            tracing::trace!(attempts, "No credential yet");
            delay = self.policy.poll_interval;
        }
    }
}

/// Wait for a token event with a value. `None` means the receiver lagged
/// and the caller should read the store instead.
async fn next_sign_in(events: &mut broadcast::Receiver<StorageEvent>) -> Option<StorageEvent> {
    loop {
        match events.recv().await {
            Ok(event) if event.credential().is_some() => return Some(event),
            Ok(_) => continue,
            Err(RecvError::Lagged(_)) => return None,
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
