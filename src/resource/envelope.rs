//! The backend's JSON response envelope.
//!
//! ```json
//! { "success": true, "message": "OK",
//!   "result": { "success": true, "data": { ... } },
//!   "errors": null, "except": null }
//! ```

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<EnvelopeResult>,
    #[serde(default)]
    pub errors: Option<Value>,
    #[serde(default)]
    pub except: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvelopeResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiEnvelope {
    /// The nested payload, when present and not `null`.
    pub fn into_data(self) -> Option<Value> {
        self.result
            .and_then(|r| r.data)
            .filter(|data| !data.is_null())
    }

    /// Server message, if non-blank.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// Best-effort read of the `message` field of an error body.
pub fn server_message(body: &[u8]) -> Option<String> {
    let envelope: ApiEnvelope = serde_json::from_slice(body).ok()?;
    envelope.message().map(str::to_string)
}
