//! Navigator that records redirects.

use std::sync::{Arc, Mutex};

use crate::traits::Navigator;

/// Records every sign-in redirect for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    redirects: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry points navigated to, in order.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.lock().unwrap().len()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_sign_in(&self, entry_point: &str) {
        self.redirects.lock().unwrap().push(entry_point.to_string());
    }
}
