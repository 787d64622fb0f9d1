//! Navigation seam.
//!
//! Session expiry has exactly one outbound UI effect: sending the user to
//! the sign-in entry point. Rendering and routing live elsewhere.

/// Trait for leaving protected content.
pub trait Navigator: Send + Sync {
    /// Navigate to the sign-in entry point.
    fn redirect_to_sign_in(&self, entry_point: &str);
}
