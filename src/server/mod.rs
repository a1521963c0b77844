//! HTTP server receiving Trello webhook deliveries.
//!
//! # Endpoints
//!
//! - `HEAD /`, `POST /` - create and remove twins on member changes
//! - `HEAD /twin`, `POST /twin` - same as `/`
//! - `HEAD /sync`, `POST /sync` - mirror archive status between twins
//! - `GET /health` - returns 200 if the server is running

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

pub mod health;
pub mod webhook;

pub use health::health_handler;

use crate::gateway::TrelloGateway;
use crate::twin::TwinSettings;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    gateway: Arc<dyn TrelloGateway>,
    settings: TwinSettings,
}

impl AppState {
    pub fn new(gateway: Arc<dyn TrelloGateway>, settings: TwinSettings) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { gateway, settings }),
        }
    }

    pub fn gateway(&self) -> &dyn TrelloGateway {
        self.inner.gateway.as_ref()
    }

    pub fn settings(&self) -> &TwinSettings {
        &self.inner.settings
    }
}

pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, head};
    use webhook::{membership_handler, probe_handler, status_handler};

    axum::Router::new()
        .route("/", head(probe_handler).post(membership_handler))
        .route("/twin", head(probe_handler).post(membership_handler))
        .route("/sync", head(probe_handler).post(status_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

pub async fn serve(app_state: AppState, bind: std::net::SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(%bind, "Listening for Trello webhooks");
    axum::serve(listener, build_router(app_state))
        .await
        .context("HTTP server stopped")
}
