use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;

use super::*;
use crate::test_support::serve;

type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

/// Remote stand-in that records each call and answers with `status`/`body`.
async fn remote(status: StatusCode, body: &'static str) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new().route(
        "/api/v1/run/flow",
        post({
            let captured = Arc::clone(&captured);
            move |headers: HeaderMap, Json(payload): Json<serde_json::Value>| {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(ToOwned::to_owned);
                captured.lock().unwrap().push((auth, payload));
                async move { (status, body) }
            }
        }),
    );
    let base = serve(router).await;
    (format!("{base}/api/v1/run/flow"), captured)
}

fn request() -> GenerateRequest {
    GenerateRequest {
        input_value: Some(serde_json::json!("hello")),
        output_type: Some(serde_json::json!("chat")),
        input_type: Some(serde_json::json!("chat")),
    }
}

#[test]
fn parse_response_accepts_json() {
    assert_eq!(parse_response(r#"{"result": 42}"#).unwrap(), serde_json::json!({ "result": 42 }));
}

#[test]
fn parse_response_rejects_non_json() {
    assert!(matches!(parse_response("<html>"), Err(FlowError::Parse(_))));
}

#[test]
fn request_omits_absent_fields() {
    let partial = GenerateRequest { input_value: Some(serde_json::json!("x")), ..GenerateRequest::default() };
    assert_eq!(serde_json::to_value(&partial).unwrap(), serde_json::json!({ "input_value": "x" }));
}

#[test]
fn request_keeps_explicit_null_distinct_from_absent() {
    let parsed: GenerateRequest =
        serde_json::from_str(r#"{"input_value":null,"output_type":"chat"}"#).unwrap();

    assert_eq!(parsed.input_value, Some(serde_json::Value::Null));
    assert_eq!(parsed.input_type, None);
    assert_eq!(
        serde_json::to_value(&parsed).unwrap(),
        serde_json::json!({ "input_value": null, "output_type": "chat" })
    );
}

#[tokio::test]
async fn run_sends_bearer_token_and_payload_verbatim() {
    let (url, captured) = remote(StatusCode::OK, r#"{"outputs":[{"text":"hi"}]}"#).await;
    let client = FlowClient::new(&url).unwrap();

    let result = client.run("secret-token", &request()).await.unwrap();

    assert_eq!(result, serde_json::json!({ "outputs": [{ "text": "hi" }] }));
    let calls = captured.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.as_deref(), Some("Bearer secret-token"));
    assert_eq!(
        calls[0].1,
        serde_json::json!({ "input_value": "hello", "output_type": "chat", "input_type": "chat" })
    );
}

#[tokio::test]
async fn run_surfaces_remote_status_and_body() {
    let (url, captured) = remote(StatusCode::SERVICE_UNAVAILABLE, "down").await;
    let client = FlowClient::new(&url).unwrap();

    let err = client.run("t", &request()).await.unwrap_err();

    assert!(matches!(err, FlowError::Remote { status: 503, ref body } if body == "down"));
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn run_success_with_non_json_body_is_parse_error() {
    let (url, _captured) = remote(StatusCode::OK, "not json").await;
    let client = FlowClient::new(&url).unwrap();

    assert!(matches!(client.run("t", &request()).await, Err(FlowError::Parse(_))));
}

#[tokio::test]
async fn run_unreachable_remote_is_request_error() {
    let client = FlowClient::new("http://127.0.0.1:9/run").unwrap();
    assert!(matches!(client.run("t", &request()).await, Err(FlowError::Request(_))));
}
