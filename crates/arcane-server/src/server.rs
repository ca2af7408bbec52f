// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use arcane_core::ArcaneError;
use arcane_store::DocumentStore;

use crate::auth::{AuthConfig, auth_middleware};
use crate::gm::{self, GmScript};
use crate::handlers;
use crate::rate_limit::{RateLimiter, RatePolicy};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The document store gateway.
    pub store: Arc<DocumentStore>,
    /// Token minting and verification.
    pub auth: AuthConfig,
    /// Fixed-window request throttle.
    pub limiter: Arc<RateLimiter>,
    /// Policy for commands and the stream endpoint.
    pub command_policy: RatePolicy,
    /// Looser policy for message sends.
    pub message_policy: RatePolicy,
    /// Scene script played by the narration stream.
    pub gm: Arc<GmScript>,
    /// Process start time for uptime reporting.
    pub started: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<DocumentStore>,
        auth: AuthConfig,
        command_policy: RatePolicy,
        message_policy: RatePolicy,
        gm: GmScript,
    ) -> Self {
        Self {
            store,
            auth,
            limiter: Arc::new(RateLimiter::new()),
            command_policy,
            message_policy,
            gm: Arc::new(gm),
            started: Instant::now(),
        }
    }
}

/// Server bind configuration (mirrors the `[server]` config section).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Default rate policies: 60 commands/60s, 120 messages/60s.
pub fn default_policies() -> (RatePolicy, RatePolicy) {
    (
        RatePolicy::per_window(60, Duration::from_secs(60)),
        RatePolicy::per_window(120, Duration::from_secs(60)),
    )
}

/// Builds the full application router.
///
/// - Public: GET /v1/health, POST /v1/auth/anonymous, GET /v1/gm/stream
///   (the stream authenticates nothing and throttles by peer address).
/// - Authenticated commands: POST /v1/sessions, /v1/sessions/join,
///   /v1/sessions/start, /v1/messages, /v1/puzzles/validate.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/v1/health", get(handlers::get_health))
        .route("/v1/auth/anonymous", post(handlers::post_anonymous))
        .route("/v1/gm/stream", get(gm::gm_stream))
        .with_state(state.clone());

    let command_routes = Router::new()
        .route("/v1/sessions", post(handlers::create_session))
        .route("/v1/sessions/join", post(handlers::join_session))
        .route("/v1/sessions/start", post(handlers::start_session))
        .route("/v1/messages", post(handlers::send_message))
        .route("/v1/puzzles/validate", post(handlers::validate_puzzle))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(command_routes)
        .layer(CorsLayer::permissive())
}

/// Binds to the configured host:port and serves until the task is dropped.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), ArcaneError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ArcaneError::Stream {
            message: format!("failed to bind server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("server listening on {addr}");
    serve_on(listener, state).await
}

/// Serves on an already-bound listener. Used by tests to bind port 0.
pub async fn serve_on(
    listener: tokio::net::TcpListener,
    state: AppState,
) -> Result<(), ArcaneError> {
    let app = build_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| ArcaneError::Stream {
        message: format!("server error: {e}"),
        source: Some(Box::new(e)),
    })
}
