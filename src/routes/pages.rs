//! Guarded SPA page routes.
//!
//! Every route-table path serves the built `index.html` once the navigation
//! guard allows it. The caller's session is the access token from the
//! `sb-access-token` cookie (or an `Authorization: Bearer` header), validated
//! live against the auth provider on each request.

use std::path::Path;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::auth::gotrue::TokenSession;
use crate::router::guard::{self, Decision};
use crate::state::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

pub async fn page(State(state): State<AppState>, jar: CookieJar, headers: HeaderMap, uri: Uri) -> Response {
    let full_path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned());

    let source = TokenSession::new(state.gotrue.clone(), access_token(&jar, &headers));
    match guard::evaluate(&state.routes, &full_path, &source).await {
        Decision::Allow => serve_shell(&state.dist_dir).await,
        Decision::RedirectTo(redirect) => Redirect::temporary(&redirect.location(&state.routes)).into_response(),
    }
}

/// Cookie first, then bearer header. Blank values count as absent.
fn access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    let from_cookie = jar.get(ACCESS_TOKEN_COOKIE).map(Cookie::value);
    let from_header = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    };
    from_cookie
        .or_else(from_header)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
}

async fn serve_shell(dist_dir: &Path) -> Response {
    let index = dist_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, path = %index.display(), "application shell unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "application shell not built").into_response()
        }
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
