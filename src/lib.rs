//! Tradewatch - data layer of the trade tracking admin dashboard
//!
//! An authenticated, staleness-aware, single-flight resource cache with
//! cross-context session synchronization, instantiated once per dashboard
//! metric.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod credential_watcher;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod resource;
pub mod traits;
