//! Development reverse proxy: `{prefix}/rest` → `{target}/rest`.
//!
//! Mounted only when `DEV_PROXY_TARGET` is configured. Forwards method, body,
//! and a small header allowlist; relays status, content type, and body.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Path below `prefix`, or `None` when `path` is outside it.
#[must_use]
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    match rest {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// Remote URL for an inbound `path_and_query` under `prefix`.
#[must_use]
pub fn target_url(target: &str, prefix: &str, path_and_query: &str) -> Option<String> {
    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    };
    let rest = strip_prefix(path, prefix)?;
    let base = target.trim_end_matches('/');
    Some(match query {
        Some(query) => format!("{base}{rest}?{query}"),
        None => format!("{base}{rest}"),
    })
}

pub async fn forward(State(state): State<AppState>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let Some(proxy) = &state.dev_proxy else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let path_and_query = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
    let Some(url) = target_url(&proxy.target, &proxy.prefix, path_and_query) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut request = state.http.request(method, &url).body(body);
    for name in [header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE] {
        if let Some(value) = headers.get(&name) {
            request = request.header(name, value);
        }
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, %url, "dev proxy request failed");
            return (StatusCode::BAD_GATEWAY, "dev proxy target unreachable").into_response();
        }
    };

    let status = response.status();
    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, %url, "dev proxy response read failed");
            return (StatusCode::BAD_GATEWAY, "dev proxy response unreadable").into_response();
        }
    };

    let mut relayed = Response::new(Body::from(bytes));
    *relayed.status_mut() = status;
    if let Some(content_type) = content_type {
        relayed.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    relayed
}

#[cfg(test)]
#[path = "dev_proxy_test.rs"]
mod tests;
