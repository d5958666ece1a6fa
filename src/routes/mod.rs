//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the flow proxy, one guarded page route per route-table entry, the
//! built SPA assets, and (in development) the reverse proxy under a single
//! Axum router.

pub mod dev_proxy;
pub mod generate;
pub mod pages;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route("/api/generate", any(generate::generate))
        .route("/healthz", get(healthz));

    // `RouteTable::by_path` tolerates a trailing slash, so mount both forms.
    for route in state.routes.routes() {
        router = router.route(route.path, get(pages::page));
        if route.path != "/" {
            router = router.route(&format!("{}/", route.path), get(pages::page));
        }
    }

    if let Some(proxy) = &state.dev_proxy {
        router = router
            .route(&proxy.prefix, any(dev_proxy::forward))
            .route(&format!("{}/{{*rest}}", proxy.prefix), any(dev_proxy::forward));
    }

    let assets = ServeDir::new(state.dist_dir.join("assets"));
    router
        .nest_service("/assets", assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON error body shared by the API routes: `{"message": "..."}`.
pub(crate) fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "message": message.into() }))).into_response()
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
