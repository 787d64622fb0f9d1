//! Navigator for headless runs.
//!
//! There is no router to drive outside the browser, so the redirect is
//! surfaced in the log for the operator.

use crate::traits::Navigator;

/// Navigator that logs the redirect request.
#[derive(Debug, Clone, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_sign_in(&self, entry_point: &str) {
        tracing::warn!(entry_point, "Session expired, sign in again to resume the dashboard");
    }
}
