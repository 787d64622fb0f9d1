//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileSessionStorage`] - JSON-file session storage
//! - [`LogNavigator`] - Logs sign-in redirects for headless runs
//!
//! The [`mock`] submodule provides test doubles for all of them.

pub mod file_storage;
pub mod log_navigator;
pub mod mock;
pub mod reqwest_http;

pub use file_storage::FileSessionStorage;
pub use log_navigator::LogNavigator;
pub use mock::{InMemoryStorage, MockHttpClient, MockResponse, RecordingNavigator};
pub use reqwest_http::ReqwestHttpClient;
