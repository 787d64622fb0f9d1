//! Reqwest-backed [`HttpClient`] for the dashboard API.
//!
//! Only GETs are issued. A non-2xx answer is still a [`Response`]; the fetch
//! coordinator classifies it. Transport failures are mapped onto the
//! [`HttpError`] variants the coordinator reports as request failures, with
//! the URL stripped from the message so it never ends up in a resource's
//! error string.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::time::Duration;

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// Dashboard HTTP client.
///
/// ```ignore
/// let client = ReqwestHttpClient::new(Some(Duration::from_secs(10)))?;
/// let response = client.get(&config.endpoint_url("/api/dashboard/totals"), &headers).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client. `timeout` bounds each request from connect to the
    /// last body byte; `None` leaves only the transport defaults.
    pub fn new(timeout: Option<Duration>) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport_error)?;
        Ok(Self { client })
    }
}

/// Translate seam headers into a reqwest header map. The bearer credential
/// is marked sensitive so reqwest never prints it.
fn header_map(headers: &Headers) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HttpError::Other(format!("Invalid header name '{}'", name)))?;
        let mut value = HeaderValue::from_str(value)
            .map_err(|_| HttpError::Other(format!("Invalid value for header '{}'", name)))?;
        if name == AUTHORIZATION {
            value.set_sensitive(true);
        }
        map.insert(name, value);
    }
    Ok(map)
}

fn transport_error(err: reqwest::Error) -> HttpError {
    let err = err.without_url();
    if err.is_timeout() {
        HttpError::Timeout(err.to_string())
    } else if err.is_connect() {
        HttpError::ConnectionFailed(err.to_string())
    } else if let Some(status) = err.status() {
        HttpError::ServerError {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else if err.is_builder() {
        HttpError::InvalidUrl(err.to_string())
    } else {
        HttpError::Other(err.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        let response = self
            .client
            .get(url)
            .headers(header_map(headers)?)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let response_headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = response.bytes().await.map_err(transport_error)?;

        tracing::trace!(status, bytes = body.len(), "GET completed");
        Ok(Response::with_headers(status, response_headers, body))
    }
}
