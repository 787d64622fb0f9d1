//! Single-flight authenticated fetch of one resource.
//!
//! One call performs at most one GET. The outcome is classified into
//! success, a request failure, a server-reported failure or a rejected
//! credential, and written to the resource state unless the activation
//! was cancelled meanwhile.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;

use super::cancel::CancelToken;
use super::envelope::{server_message, ApiEnvelope};
use super::state::SharedState;
use crate::auth::{Credential, SessionExpiryHandler};
use crate::error::{FetchError, SERVER_FAILURE_MESSAGE};
use crate::traits::{Headers, HttpClient, HttpError, Response};

/// Turns the envelope's `result.data` into the resource's value.
pub type UnwrapFn<T> = fn(Value) -> Result<T, serde_json::Error>;

/// What one fetch attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchReport {
    /// A value was stored
    Fetched,
    /// Another fetch already held the slot; nothing was sent
    InFlight,
    /// The request failed; see the error
    Failed(FetchError),
    /// The activation ended; nothing was written
    Cancelled,
}

pub struct FetchCoordinator<T> {
    name: &'static str,
    url: String,
    http: Arc<dyn HttpClient>,
    unwrap: UnwrapFn<T>,
    expiry: Arc<SessionExpiryHandler>,
}

impl<T: Clone> FetchCoordinator<T> {
    pub fn new(
        name: &'static str,
        url: String,
        http: Arc<dyn HttpClient>,
        unwrap: UnwrapFn<T>,
        expiry: Arc<SessionExpiryHandler>,
    ) -> Self {
        Self {
            name,
            url,
            http,
            unwrap,
            expiry,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch with `credential` and record the outcome in `shared`.
    pub async fn fetch(
        &self,
        shared: &SharedState<T>,
        credential: &Credential,
        cancel: &CancelToken,
    ) -> FetchReport {
        if cancel.is_cancelled() {
            return FetchReport::Cancelled;
        }

        if !shared.update(|s| s.begin_fetch(credential.fingerprint())) {
            tracing::debug!(resource = self.name, "Fetch already in flight, skipping");
            return FetchReport::InFlight;
        }

        tracing::debug!(resource = self.name, url = %self.url, "Fetching");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = self.request(credential) => Some(outcome),
        };

        let outcome = match outcome {
            Some(outcome) if !cancel.is_cancelled() => outcome,
            _ => {
                tracing::debug!(resource = self.name, "Fetch cancelled, discarding result");
                return FetchReport::Cancelled;
            }
        };

        match outcome {
            Ok(value) => {
                shared.update(|s| {
                    s.record_success(value, Instant::now(), Utc::now());
                    s.finish_fetch();
                });
                tracing::info!(resource = self.name, "Fetched");
                FetchReport::Fetched
            }
            Err(FetchError::SessionExpired) => {
                tracing::warn!(
                    resource = self.name,
                    fingerprint = %credential.fingerprint(),
                    "Credential rejected"
                );
                self.expiry
                    .handle(credential, || {
                        if !cancel.is_cancelled() {
                            shared.update(|s| {
                                s.record_session_expired();
                                s.finish_fetch();
                            });
                        }
                    })
                    .await;
                FetchReport::Failed(FetchError::SessionExpired)
            }
            Err(error) => {
                let message = error.user_message().unwrap_or_default().to_string();
                tracing::warn!(
                    resource = self.name,
                    code = error.error_code(),
                    "Fetch failed: {}",
                    message
                );
                shared.update(|s| {
                    s.record_failure(message);
                    s.finish_fetch();
                });
                FetchReport::Failed(error)
            }
        }
    }

    async fn request(&self, credential: &Credential) -> Result<T, FetchError> {
        let mut headers = Headers::new();
        headers.insert("Authorization".to_string(), credential.bearer());
        headers.insert("Accept".to_string(), "application/json".to_string());

        match self.http.get(&self.url, &headers).await {
            Ok(response) => self.classify(response),
            Err(error) => Err(transport_failure(error)),
        }
    }

    fn classify(&self, response: Response) -> Result<T, FetchError> {
        if response.is_unauthorized() {
            return Err(FetchError::SessionExpired);
        }

        if !response.is_success() {
            let server = server_message(&response.body);
            let transport = format!("Request failed with status {}", response.status);
            return Err(FetchError::request_failed([
                server.as_deref(),
                Some(transport.as_str()),
            ]));
        }

        let envelope: ApiEnvelope = response.json().map_err(|e| {
            tracing::debug!(resource = self.name, "Unparseable body: {}", e);
            FetchError::request_failed([Some("Invalid response from server")])
        })?;

        if !envelope.success {
            tracing::debug!(
                resource = self.name,
                message = envelope.message().unwrap_or_default(),
                "Server reported failure"
            );
            return Err(FetchError::ServerReported(SERVER_FAILURE_MESSAGE.to_string()));
        }

        let data = envelope
            .into_data()
            .ok_or_else(|| FetchError::request_failed([Some("Response contained no data")]))?;

        (self.unwrap)(data).map_err(|e| {
            tracing::debug!(resource = self.name, "Unexpected payload shape: {}", e);
            FetchError::request_failed([Some("Unexpected data format from server")])
        })
    }
}

/// Classify an `Err` from the HTTP seam.
fn transport_failure(error: HttpError) -> FetchError {
    if error.status() == Some(401) {
        return FetchError::SessionExpired;
    }
    let server = match &error {
        HttpError::ServerError { message, .. } => server_message(message.as_bytes()),
        _ => None,
    };
    let transport = error.to_string();
    FetchError::request_failed([server.as_deref(), Some(transport.as_str())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryStorage, MockHttpClient, MockResponse, RecordingNavigator};
    use crate::auth::CredentialService;
    use crate::error::FALLBACK_FAILURE_MESSAGE;
    use crate::resource::ResourcePhase;
    use serde_json::json;
    use std::time::Duration;

    const URL: &str = "https://api.test/api/dashboard/totals";

    struct Fixture {
        http: MockHttpClient,
        storage: InMemoryStorage,
        navigator: RecordingNavigator,
        coordinator: FetchCoordinator<u64>,
        shared: SharedState<u64>,
    }

    fn unwrap_total(data: Value) -> Result<u64, serde_json::Error> {
        #[derive(serde::Deserialize)]
        struct Totals {
            total: u64,
        }
        serde_json::from_value::<Totals>(data).map(|t| t.total)
    }

    fn fixture() -> Fixture {
        let http = MockHttpClient::new();
        let storage = InMemoryStorage::with_token("tok");
        let navigator = RecordingNavigator::new();
        let service = Arc::new(CredentialService::new(Arc::new(storage.clone())));
        let expiry = Arc::new(SessionExpiryHandler::new(
            service,
            Arc::new(navigator.clone()),
            "/sign-in",
        ));
        let coordinator = FetchCoordinator::new(
            "totals",
            URL.to_string(),
            Arc::new(http.clone()),
            unwrap_total,
            expiry,
        );
        Fixture {
            http,
            storage,
            navigator,
            coordinator,
            shared: SharedState::new(),
        }
    }

    fn credential() -> Credential {
        Credential::new("tok").unwrap()
    }

    #[tokio::test]
    async fn test_success_stores_value_and_sends_headers() {
        let f = fixture();
        f.http.set_response(URL, MockResponse::envelope(json!({ "total": 42 })));

        let report = f.coordinator.fetch(&f.shared, &credential(), &CancelToken::new()).await;

        assert_eq!(report, FetchReport::Fetched);
        let snapshot = f.shared.snapshot();
        assert_eq!(snapshot.value, Some(42));
        assert!(!snapshot.loading);
        assert!(snapshot.last_fetch_at.is_some());
        assert!(snapshot.fetched_at.is_some());

        let requests = f.http.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization(), Some("Bearer tok"));
        assert_eq!(
            requests[0].headers.get("Accept").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_server_reported_failure_uses_generic_message() {
        let f = fixture();
        f.http.set_response(URL, MockResponse::envelope_failure("Quota exceeded"));

        let report = f.coordinator.fetch(&f.shared, &credential(), &CancelToken::new()).await;

        assert_eq!(
            report,
            FetchReport::Failed(FetchError::ServerReported(SERVER_FAILURE_MESSAGE.to_string()))
        );
        assert_eq!(f.shared.snapshot().error.as_deref(), Some(SERVER_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn test_error_status_prefers_server_message() {
        let f = fixture();
        f.http.set_response(
            URL,
            MockResponse::status(500, json!({ "success": false, "message": "Database unavailable" })),
        );

        f.coordinator.fetch(&f.shared, &credential(), &CancelToken::new()).await;

        assert_eq!(f.shared.snapshot().error.as_deref(), Some("Database unavailable"));
    }

    #[tokio::test]
    async fn test_error_status_without_message_uses_status() {
        let f = fixture();
        f.http.set_response(URL, MockResponse::status(502, json!({})));

        f.coordinator.fetch(&f.shared, &credential(), &CancelToken::new()).await;

        assert_eq!(
            f.shared.snapshot().error.as_deref(),
            Some("Request failed with status 502")
        );
    }

    #[tokio::test]
    async fn test_transport_error_keeps_previous_value() {
        let f = fixture();
        f.http.push_response(URL, MockResponse::envelope(json!({ "total": 1 })));
        f.http.push_response(
            URL,
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );

        f.coordinator.fetch(&f.shared, &credential(), &CancelToken::new()).await;
        let first = f.shared.snapshot();
        f.coordinator.fetch(&f.shared, &credential(), &CancelToken::new()).await;
        let second = f.shared.snapshot();

        assert_eq!(second.value, Some(1));
        assert_eq!(second.last_fetch_at, first.last_fetch_at);
        assert_eq!(second.error.as_deref(), Some("Connection failed: refused"));
        assert_eq!(second.phase, ResourcePhase::Error);
    }

    #[tokio::test]
    async fn test_missing_data_is_request_failure() {
        let f = fixture();
        f.http.set_response(
            URL,
            MockResponse::status(200, json!({ "success": true, "result": { "success": true } })),
        );

        let report = f.coordinator.fetch(&f.shared, &credential(), &CancelToken::new()).await;

        assert!(matches!(report, FetchReport::Failed(FetchError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_unauthorized_marks_expired_and_redirects() {
        let f = fixture();
        f.http.set_response(URL, MockResponse::unauthorized());

        let report = f.coordinator.fetch(&f.shared, &credential(), &CancelToken::new()).await;

        assert_eq!(report, FetchReport::Failed(FetchError::SessionExpired));
        let snapshot = f.shared.snapshot();
        assert!(snapshot.is_session_expired);
        assert!(snapshot.error.is_none());
        assert!(!snapshot.loading);
        assert!(f.storage.peek(crate::traits::TOKEN_KEY).is_none());
        assert_eq!(f.navigator.redirects(), vec!["/sign-in".to_string()]);
    }

    #[tokio::test]
    async fn test_unauthorized_transport_error_is_expiry() {
        let f = fixture();
        f.http.set_response(
            URL,
            MockResponse::Error(HttpError::ServerError {
                status: 401,
                message: String::new(),
            }),
        );

        let report = f.coordinator.fetch(&f.shared, &credential(), &CancelToken::new()).await;

        assert_eq!(report, FetchReport::Failed(FetchError::SessionExpired));
        assert_eq!(f.navigator.redirect_count(), 1);
    }

    #[test]
    fn test_transport_failure_falls_back() {
        let error = transport_failure(HttpError::ServerError {
            status: 503,
            message: r#"{"message":"Maintenance"}"#.to_string(),
        });
        assert_eq!(error, FetchError::RequestFailed("Maintenance".to_string()));

        let error = FetchError::request_failed([None, Some(" ")]);
        assert_eq!(error.user_message(), Some(FALLBACK_FAILURE_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_fetches_issue_one_request() {
        let f = fixture();
        f.http.set_response(URL, MockResponse::envelope(json!({ "total": 5 })));
        f.http.set_delay(Duration::from_millis(100));
        let cancel = CancelToken::new();
        let credential = credential();

        let (a, b) = tokio::join!(
            f.coordinator.fetch(&f.shared, &credential, &cancel),
            f.coordinator.fetch(&f.shared, &credential, &cancel),
        );

        assert_eq!(a, FetchReport::Fetched);
        assert_eq!(b, FetchReport::InFlight);
        assert_eq!(f.http.request_count(URL), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_fetch_writes_nothing() {
        let f = fixture();
        f.http.set_response(URL, MockResponse::envelope(json!({ "total": 5 })));
        f.http.set_delay(Duration::from_millis(100));
        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let report = f.coordinator.fetch(&f.shared, &credential(), &cancel).await;

        assert_eq!(report, FetchReport::Cancelled);
        assert!(f.shared.snapshot().value.is_none());
    }
}
