//! Session expiry handling.
//!
//! Shared by every resource of a dashboard so that a rejected credential
//! produces one storage clear and one redirect, however many resources see
//! the 401.

use std::sync::Arc;

use super::credential::Credential;
use super::service::CredentialService;
use crate::traits::Navigator;

pub struct SessionExpiryHandler {
    service: Arc<CredentialService>,
    navigator: Arc<dyn Navigator>,
    sign_in_path: String,
}

impl SessionExpiryHandler {
    pub fn new(
        service: Arc<CredentialService>,
        navigator: Arc<dyn Navigator>,
        sign_in_path: impl Into<String>,
    ) -> Self {
        Self {
            service,
            navigator,
            sign_in_path: sign_in_path.into(),
        }
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// React to a 401 for `credential`.
    ///
    /// Order: clear the stored session, run `mark_expired` (the resource's
    /// own flag update), then navigate. `mark_expired` always runs; storage
    /// and navigation only on the first rejection of this credential.
    /// Returns whether the side effects ran.
    pub async fn handle(&self, credential: &Credential, mark_expired: impl FnOnce()) -> bool {
        let first = self.service.invalidate(credential).await;
        mark_expired();
        if first {
            tracing::info!(entry_point = %self.sign_in_path, "Redirecting to sign-in");
            self.navigator.redirect_to_sign_in(&self.sign_in_path);
        }
        first
    }
}

impl std::fmt::Debug for SessionExpiryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionExpiryHandler")
            .field("sign_in_path", &self.sign_in_path)
            .finish()
    }
}
