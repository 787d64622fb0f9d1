//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted responses and delays
//! - [`InMemoryStorage`] - In-memory session storage
//! - [`RecordingNavigator`] - Records sign-in redirects

pub mod http;
pub mod navigator;
pub mod storage;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use navigator::RecordingNavigator;
pub use storage::InMemoryStorage;
