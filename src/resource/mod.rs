//! Authenticated, staleness-aware resource cache.
//!
//! One [`ResourceStore`] per remote aggregate. Each store combines:
//!
//! - a [`CredentialGate`](crate::credential_watcher::CredentialGate) before
//!   its first request;
//! - a [`StaleCache`] deciding whether a cached value can be reused;
//! - a [`FetchCoordinator`] issuing at most one request at a time;
//! - the shared [`SessionExpiryHandler`](crate::auth::SessionExpiryHandler)
//!   reacting to a rejected credential;
//! - a [`CredentialChangeWatcher`](crate::credential_watcher::CredentialChangeWatcher)
//!   revalidating when the credential changes.

mod cache;
mod cancel;
mod envelope;
mod fetch;
mod state;
mod store;

pub use cache::{StaleCache, DEFAULT_FRESHNESS_WINDOW};
pub use cancel::CancelToken;
pub use envelope::{server_message, ApiEnvelope, EnvelopeResult};
pub use fetch::{FetchCoordinator, FetchReport, UnwrapFn};
pub use state::{ResourcePhase, ResourceSnapshot, ResourceState, SharedState};
pub use store::{decode, RefreshOutcome, ResourceSpec, ResourceStore, StoreContext};
