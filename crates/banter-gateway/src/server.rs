// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. Service handles (store,
//! cache, queue, limiter, ingestor) are constructed by the binary and
//! injected here; the gateway owns no ambient global state.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use banter_billing::WebhookIngestor;
use banter_cache::ListingCache;
use banter_core::BanterError;
use banter_quota::RateLimiter;
use banter_queue::JobQueue;
use banter_storage::Database;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Single-writer database handle.
    pub db: Database,
    /// Read-through chatroom listing cache.
    pub cache: Arc<ListingCache>,
    /// Producer-side queue handle.
    pub queue: JobQueue,
    /// Daily prompt quota gate.
    pub limiter: Arc<RateLimiter>,
    /// Billing webhook ingestor; `None` disables the endpoint.
    pub ingestor: Option<Arc<WebhookIngestor>>,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

/// Gateway server configuration (mirrors ServerConfig from banter-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router for the given state.
pub fn build_router(state: GatewayState) -> Router {
    // Unauthenticated routes: health probe, and the billing webhook whose
    // auth is its signature.
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route("/webhooks/billing", post(handlers::post_billing_webhook))
        .with_state(state.clone());

    // Routes requiring bearer authentication.
    let api_routes = Router::new()
        .route("/v1/chatrooms", post(handlers::post_chatrooms))
        .route("/v1/chatrooms", get(handlers::get_chatrooms))
        .route("/v1/chatrooms/{id}", get(handlers::get_chatroom))
        .route("/v1/chatrooms/{id}/messages", post(handlers::post_message))
        .route("/v1/subscription", get(handlers::get_subscription_status))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway server, serving until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), BanterError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BanterError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| BanterError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
