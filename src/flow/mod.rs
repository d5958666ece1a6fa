//! Remote flow-execution API.
//!
//! DESIGN
//! ======
//! The proxy route depends on the `FlowRunner` trait only, so tests can stand
//! in for the remote service. `FlowClient` is the `reqwest` implementation.
//! Request fields are opaque JSON forwarded as received.

pub mod client;

pub use client::FlowClient;

use serde::{Deserialize, Deserializer, Serialize};

/// Payload of `POST /api/generate`, forwarded verbatim.
///
/// Absent fields stay absent; an explicit `null` is kept as `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub input_value: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub output_type: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<serde_json::Value>,
}

/// A field that appears in the body is `Some`, whatever its value.
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Errors produced by flow API calls.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The HTTP exchange itself failed.
    #[error("flow API request failed: {0}")]
    Request(String),

    /// The remote answered with a non-success status.
    #[error("flow API response error: status {status}")]
    Remote { status: u16, body: String },

    /// The success body was not JSON.
    #[error("flow API response parse failed: {0}")]
    Parse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[async_trait::async_trait]
pub trait FlowRunner: Send + Sync {
    /// Run the flow once with `token` as bearer credential. No retry.
    async fn run(&self, token: &str, request: &GenerateRequest) -> Result<serde_json::Value, FlowError>;
}
