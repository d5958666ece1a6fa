//! `/api/generate` — forward one request to the flow API with the server credential.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use super::message;
use crate::flow::{FlowError, GenerateRequest};
use crate::state::AppState;

pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";
pub const MISSING_TOKEN_MESSAGE: &str = "API token is not configured.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Any method is routed here so non-POST gets the JSON 405 body.
pub async fn generate(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return message(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE);
    }

    let Some(token) = state.flow_token.as_deref() else {
        tracing::error!("generate request rejected: flow API token not configured");
        return message(StatusCode::INTERNAL_SERVER_ERROR, MISSING_TOKEN_MESSAGE);
    };

    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "generate request body rejected");
            return message(StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"));
        }
    };

    match state.flow.run(token, &request).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(FlowError::Remote { status, body }) => {
            tracing::error!(status, body = %body, "flow API error");
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            message(status, format!("External API Error: {body}"))
        }
        Err(e) => {
            tracing::error!(error = %e, "generate proxy failed");
            message(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}

/// Empty body means every field is absent.
fn parse_request(body: &[u8]) -> Result<GenerateRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateRequest::default());
    }
    serde_json::from_slice(body)
}

#[cfg(test)]
#[path = "generate_test.rs"]
mod tests;
