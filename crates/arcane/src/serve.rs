// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `arcane serve` command implementation.
//!
//! Opens the document store, assembles the server state from config, and
//! serves the command endpoints and GM narration stream.

use std::sync::Arc;
use std::time::Duration;

use arcane_config::ArcaneConfig;
use arcane_core::ArcaneError;
use arcane_server::{AppState, AuthConfig, GmScript, RatePolicy, ServerConfig, start_server};
use arcane_store::DocumentStore;
use tracing::info;

/// Initializes the tracing subscriber from config (overridable via
/// `RUST_LOG`).
pub fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs the `arcane serve` command until the process is stopped.
pub async fn run_serve(config: ArcaneConfig) -> Result<(), ArcaneError> {
    init_tracing(&config.service.log_level);

    info!(name = %config.service.name, "starting arcane serve");

    let store = Arc::new(DocumentStore::open(&config.storage.database_path).await?);
    info!(path = %config.storage.database_path, "document store opened");

    if config.server.auth_secret.is_empty() {
        tracing::warn!("no auth secret configured -- all command requests will be rejected");
    }

    let window = Duration::from_secs(config.limits.window_secs);
    let state = AppState::new(
        store,
        AuthConfig::new(config.server.auth_secret.clone()),
        RatePolicy::per_window(config.limits.command_limit, window),
        RatePolicy::per_window(config.limits.message_limit, window),
        GmScript {
            chunks: config.gm.chunks.clone(),
            narration: config.gm.narration.clone(),
            public_hints: config.gm.public_hints.clone(),
            chunk_delay: Duration::from_millis(config.gm.chunk_delay_ms),
        },
    );

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&server_config, state).await
}
