use std::sync::Arc;

use flowdeck::auth::gotrue::GoTrueClient;
use flowdeck::config::AppConfig;
use flowdeck::flow::FlowClient;
use flowdeck::routes;
use flowdeck::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    if config.flow_api_token.is_none() {
        tracing::warn!("FLOW_API_TOKEN not set; /api/generate will report a configuration error");
    }

    let flow = FlowClient::new(&config.flow_api_url).expect("flow client init failed");

    // Non-fatal: without GoTrue every protected page fails closed.
    let gotrue = config.gotrue.as_ref().and_then(|gotrue| match GoTrueClient::new(gotrue) {
        Ok(client) => {
            tracing::info!(url = %gotrue.url, "auth provider configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "auth provider unavailable; protected pages will redirect to login");
            None
        }
    });
    if config.gotrue.is_none() {
        tracing::warn!("SUPABASE_URL/SUPABASE_ANON_KEY not set; protected pages will redirect to login");
    }

    if let Some(proxy) = &config.dev_proxy {
        tracing::info!(prefix = %proxy.prefix, target = %proxy.target, "dev proxy enabled");
    }

    let state = AppState::new(Arc::new(flow), config.flow_api_token.clone())
        .with_gotrue(gotrue)
        .with_dist_dir(config.dist_dir.clone())
        .with_dev_proxy(config.dev_proxy.clone());

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "flowdeck listening");
    axum::serve(listener, app).await.expect("server failed");
}
