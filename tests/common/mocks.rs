//! Mock implementations for test fixtures.
//!
//! This module re-exports the mock implementations from
//! `tradewatch::adapters::mock` and provides payload helpers.

pub use tradewatch::adapters::mock::{InMemoryStorage, MockHttpClient, MockResponse, RecordingNavigator};
pub use tradewatch::traits::TOKEN_KEY;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Minimal payload used by single-store tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total: u64,
}

pub const TOTALS: &str = "/api/dashboard/totals";

/// Envelope carrying `{ "total": n }`.
pub fn totals(n: u64) -> MockResponse {
    MockResponse::envelope(json!({ "total": n }))
}

/// A successful envelope around arbitrary data.
pub fn envelope(data: Value) -> MockResponse {
    MockResponse::envelope(data)
}

/// Sample data for each dashboard endpoint.
pub fn dashboard_payloads() -> Vec<(&'static str, Value)> {
    vec![
        ("/api/dashboard/totals", json!({ "total": 120 })),
        (
            "/api/dashboard/accepted-by-supervisor",
            json!([{ "supervisor_id": 1, "supervisor": "Awa", "accepted": 40 }]),
        ),
        (
            "/api/dashboard/rejected-by-level",
            json!([{ "level": "L1", "rejected": 3 }, { "level": "L2", "rejected": 2 }]),
        ),
        ("/api/dashboard/pending", json!({ "pending": 15 })),
        (
            "/api/dashboard/monthly",
            json!([{ "month": "2024-01", "total": 60 }, { "month": "2024-02", "total": 60 }]),
        ),
        (
            "/api/dashboard/validation-stats",
            json!({ "validated": 80, "rejected": 20, "pending": 15 }),
        ),
    ]
}
