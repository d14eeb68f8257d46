//! HTTP server for the autopatch agent.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries and handles them
//!   before responding
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use tower_http::trace::TraceLayer;

use crate::agent::Agent;
use crate::effects::GitHubConnector;
use crate::patch::ModelClient;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{DeliveryResponse, FailureDetail, WebhookError, webhook_handler};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<C, M> {
    inner: Arc<AppStateInner<C, M>>,
}

struct AppStateInner<C, M> {
    agent: Agent<C, M>,

    /// Webhook secret for HMAC-SHA256 signature verification.
    webhook_secret: Vec<u8>,
}

// Derived Clone would require C: Clone and M: Clone.
impl<C, M> Clone for AppState<C, M> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, M> AppState<C, M> {
    pub fn new(agent: Agent<C, M>, webhook_secret: impl Into<Vec<u8>>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                agent,
                webhook_secret: webhook_secret.into(),
            }),
        }
    }

    pub fn agent(&self) -> &Agent<C, M> {
        &self.inner.agent
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<C, M>(app_state: AppState<C, M>) -> axum::Router
where
    C: GitHubConnector + 'static,
    M: ModelClient + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<C, M>))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
