//! End-to-end tests through the reqwest adapter using wiremock.
//!
//! These tests verify that a resource store sends the bearer credential
//! and classifies real HTTP answers the same way it does mocked ones.

mod common;

use common::{InMemoryStorage, RecordingNavigator, Totals, TOKEN_KEY, TOTALS};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tradewatch::adapters::ReqwestHttpClient;
use tradewatch::auth::CredentialService;
use tradewatch::config::DashboardConfig;
use tradewatch::error::FALLBACK_FAILURE_MESSAGE;
use tradewatch::resource::{RefreshOutcome, ResourceSpec, ResourceStore, StoreContext};
use tradewatch::traits::{Headers, HttpClient, HttpError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PENDING: &str = "/api/dashboard/pending";

/// Helper to create a test token.
fn test_token() -> String {
    "test-auth-token".to_string()
}

struct Setup {
    storage: InMemoryStorage,
    navigator: RecordingNavigator,
    store: ResourceStore<Totals>,
}

fn setup(server: &MockServer, timeout: Option<Duration>) -> Setup {
    let client = ReqwestHttpClient::new(timeout).unwrap();
    let storage = InMemoryStorage::with_token(&test_token());
    let navigator = RecordingNavigator::new();
    let service = Arc::new(CredentialService::new(Arc::new(storage.clone())));
    let context = StoreContext::new(
        DashboardConfig::default().with_api_url(server.uri()),
        Arc::new(client),
        service,
        Arc::new(navigator.clone()),
    );
    let store = ResourceStore::new(ResourceSpec::new("totals", TOTALS), &context);
    Setup {
        storage,
        navigator,
        store,
    }
}

#[tokio::test]
async fn test_envelope_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TOTALS))
        .and(header("Authorization", format!("Bearer {}", test_token()).as_str()))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "OK",
            "result": { "success": true, "data": { "total": 42 } },
            "errors": null,
            "except": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let setup = setup(&server, None);

    assert_eq!(setup.store.refetch(true).await, RefreshOutcome::Fetched);
    assert_eq!(setup.store.snapshot().value, Some(Totals { total: 42 }));
}

#[tokio::test]
async fn test_unauthorized_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TOTALS))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Unauthenticated."
        })))
        .mount(&server)
        .await;

    let setup = setup(&server, None);

    assert_eq!(setup.store.refetch(true).await, RefreshOutcome::SessionExpired);
    let snapshot = setup.store.snapshot();
    assert!(snapshot.is_session_expired);
    assert!(snapshot.error.is_none());
    assert!(setup.storage.peek(TOKEN_KEY).is_none());
    assert_eq!(setup.navigator.redirect_count(), 1);
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TOTALS))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "message": "Database unavailable"
        })))
        .mount(&server)
        .await;

    let setup = setup(&server, None);
    setup.store.refetch(true).await;

    assert_eq!(
        setup.store.snapshot().error.as_deref(),
        Some("Database unavailable")
    );
}

#[tokio::test]
async fn test_html_error_page_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TOTALS))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let setup = setup(&server, None);
    setup.store.refetch(true).await;

    let error = setup.store.snapshot().error;
    assert_eq!(error.as_deref(), Some("Request failed with status 502"));
    assert_ne!(error.as_deref(), Some(FALLBACK_FAILURE_MESSAGE));
}

#[tokio::test]
async fn test_timeout_is_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TOTALS))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let setup = setup(&server, Some(Duration::from_millis(50)));

    assert!(matches!(
        setup.store.refetch(true).await,
        RefreshOutcome::Failed(_)
    ));
    let snapshot = setup.store.snapshot();
    assert!(snapshot.error.is_some());
    assert!(!snapshot.is_session_expired);
}

#[tokio::test]
async fn test_adapter_returns_non_success_as_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PENDING))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-request-id", "abc123")
                .set_body_string("not found"),
        )
        .mount(&server)
        .await;

    let client = ReqwestHttpClient::new(None).unwrap();
    let response = client
        .get(&format!("{}{}", server.uri(), PENDING), &Headers::new())
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert!(!response.is_success());
    assert_eq!(response.headers.get("x-request-id").map(String::as_str), Some("abc123"));
    assert_eq!(response.text().unwrap(), "not found");
}

#[tokio::test]
async fn test_adapter_timeout_maps_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PENDING))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = ReqwestHttpClient::new(Some(Duration::from_millis(50))).unwrap();
    let result = client
        .get(&format!("{}{}", server.uri(), PENDING), &Headers::new())
        .await;

    assert!(matches!(result, Err(HttpError::Timeout(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_adapter_connection_refused_hides_url() {
    // Non-pooled server so that dropping it actually closes the listener.
    let server = MockServer::builder().start().await;
    let url = format!("{}{}", server.uri(), PENDING);
    drop(server);

    let client = ReqwestHttpClient::new(None).unwrap();
    let err = client.get(&url, &Headers::new()).await.unwrap_err();

    assert!(matches!(err, HttpError::ConnectionFailed(_)), "got {:?}", err);
    assert!(!err.to_string().contains(PENDING));
}
