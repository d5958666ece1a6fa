use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::post;
use tower::ServiceExt;

use super::*;
use crate::flow::FlowClient;
use crate::routes::app;
use crate::state::test_helpers::{FakeFlow, Reply, test_app_state};
use crate::test_support::{body_json, serve};

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

/// Loopback flow API that records each JSON payload and answers `{}`.
async fn capture_remote() -> (String, Arc<Mutex<Vec<serde_json::Value>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new().route(
        "/run",
        post({
            let captured = Arc::clone(&captured);
            move |Json(payload): Json<serde_json::Value>| {
                captured.lock().unwrap().push(payload);
                async { Json(serde_json::json!({})) }
            }
        }),
    );
    let base = serve(router).await;
    (format!("{base}/run"), captured)
}

const PAYLOAD: &str = r#"{"input_value":"hello","output_type":"chat","input_type":"chat"}"#;

#[tokio::test]
async fn get_is_method_not_allowed_without_outbound_call() {
    let flow = FakeFlow::new(Reply::Json(serde_json::json!({})));
    let state = test_app_state(flow.clone(), Some("secret"));

    let response = app(state)
        .oneshot(Request::builder().uri("/api/generate").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await, serde_json::json!({ "message": "Method Not Allowed" }));
    assert_eq!(flow.call_count(), 0);
}

#[tokio::test]
async fn wrong_method_wins_over_missing_token() {
    let flow = FakeFlow::new(Reply::Transport);
    let state = test_app_state(flow.clone(), None);

    let response = app(state)
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/api/generate")
                .body(Body::from(PAYLOAD))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn missing_token_is_configuration_error_without_outbound_call() {
    let flow = FakeFlow::new(Reply::Json(serde_json::json!({})));
    let state = test_app_state(flow.clone(), None);

    let response = app(state).oneshot(post_json(PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, serde_json::json!({ "message": "API token is not configured." }));
    assert_eq!(flow.call_count(), 0);
}

#[tokio::test]
async fn remote_error_status_and_body_are_relayed() {
    let flow = FakeFlow::new(Reply::Remote(503, "down"));
    let state = test_app_state(flow.clone(), Some("secret"));

    let response = app(state).oneshot(post_json(PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("down"), "{message}");
    assert_eq!(message, "External API Error: down");
    assert_eq!(flow.call_count(), 1);
}

#[tokio::test]
async fn remote_success_json_passes_through_unchanged() {
    let flow = FakeFlow::new(Reply::Json(serde_json::json!({ "result": 42 })));
    let state = test_app_state(flow.clone(), Some("secret"));

    let response = app(state).oneshot(post_json(PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "result": 42 }));
}

#[tokio::test]
async fn payload_and_token_are_forwarded_verbatim() {
    let flow = FakeFlow::new(Reply::Json(serde_json::json!({})));
    let state = test_app_state(flow.clone(), Some("secret"));

    let body = r#"{"input_value":{"nested":[1,2]},"output_type":"chat","input_type":"text","extra":"dropped"}"#;
    let response = app(state).oneshot(post_json(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = flow.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "secret");
    assert_eq!(
        serde_json::to_value(&seen[0].1).unwrap(),
        serde_json::json!({ "input_value": { "nested": [1, 2] }, "output_type": "chat", "input_type": "text" })
    );
}

#[tokio::test]
async fn null_fields_reach_the_flow_api_as_null() {
    let (url, captured) = capture_remote().await;
    let state = AppState::new(Arc::new(FlowClient::new(&url).unwrap()), Some("secret".into()));

    let body = r#"{"input_value":null,"output_type":"chat","input_type":"chat"}"#;
    let response = app(state).oneshot(post_json(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        captured.lock().unwrap()[0],
        serde_json::json!({ "input_value": null, "output_type": "chat", "input_type": "chat" })
    );
}

#[tokio::test]
async fn transport_failure_is_generic_server_error() {
    let flow = FakeFlow::new(Reply::Transport);
    let state = test_app_state(flow.clone(), Some("secret"));

    let response = app(state).oneshot(post_json(PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body, serde_json::json!({ "message": "Internal Server Error" }));
}

#[tokio::test]
async fn malformed_remote_response_is_generic_server_error() {
    let flow = FakeFlow::new(Reply::Malformed);
    let state = test_app_state(flow.clone(), Some("secret"));

    let response = app(state).oneshot(post_json(PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], "Internal Server Error");
}

#[tokio::test]
async fn malformed_request_body_is_bad_request() {
    let flow = FakeFlow::new(Reply::Json(serde_json::json!({})));
    let state = test_app_state(flow.clone(), Some("secret"));

    let response = app(state).oneshot(post_json("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(flow.call_count(), 0);
}

#[tokio::test]
async fn empty_body_forwards_absent_fields() {
    let flow = FakeFlow::new(Reply::Json(serde_json::json!({ "ok": true })));
    let state = test_app_state(flow.clone(), Some("secret"));

    let response = app(state).oneshot(post_json("")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(flow.seen.lock().unwrap()[0].1, GenerateRequest::default());
}

#[test]
fn parse_request_whitespace_is_empty() {
    assert_eq!(parse_request(b"  \n").unwrap(), GenerateRequest::default());
}
