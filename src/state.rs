//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the flow runner and its credential, the optional auth provider
//! client, the route table, and the locations of the built SPA.

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::gotrue::GoTrueClient;
use crate::config::{DEFAULT_DIST_DIR, DevProxyConfig};
use crate::flow::FlowRunner;
use crate::router::RouteTable;

/// Clone is required by Axum; all inner fields are Arc-wrapped or cheap.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<dyn FlowRunner>,
    /// Server-held bearer credential for the flow API. `None` is reported per request.
    pub flow_token: Option<Arc<str>>,
    pub gotrue: Option<Arc<GoTrueClient>>,
    pub routes: Arc<RouteTable>,
    pub dist_dir: PathBuf,
    pub dev_proxy: Option<DevProxyConfig>,
    /// Outbound client for the dev proxy.
    pub http: reqwest::Client,
}

impl AppState {
    #[must_use]
    pub fn new(flow: Arc<dyn FlowRunner>, flow_token: Option<String>) -> Self {
        Self {
            flow,
            flow_token: flow_token.map(Arc::from),
            gotrue: None,
            routes: Arc::new(RouteTable::canonical()),
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            dev_proxy: None,
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn with_gotrue(mut self, gotrue: Option<Arc<GoTrueClient>>) -> Self {
        self.gotrue = gotrue;
        self
    }

    #[must_use]
    pub fn with_dist_dir(mut self, dist_dir: PathBuf) -> Self {
        self.dist_dir = dist_dir;
        self
    }

    #[must_use]
    pub fn with_dev_proxy(mut self, dev_proxy: Option<DevProxyConfig>) -> Self {
        self.dev_proxy = dev_proxy;
        self
    }
}
