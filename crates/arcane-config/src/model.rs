// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Arcane Relay service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Arcane Relay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArcaneConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Rate-limit policies.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// GM narration scene script.
    #[serde(default)]
    pub gm: GmConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// HMAC secret used to mint and verify bearer tokens.
    /// An empty secret rejects all authenticated requests (fail-closed).
    #[serde(default)]
    pub auth_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_secret: String::new(),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Fixed-window rate-limit policies.
///
/// Counters are process-local and best-effort: abuse mitigation, not a
/// hard quota.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Max command invocations per caller per window.
    #[serde(default = "default_command_limit")]
    pub command_limit: u32,

    /// Max message sends per caller per window.
    #[serde(default = "default_message_limit")]
    pub message_limit: u32,

    /// Window duration in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            command_limit: default_command_limit(),
            message_limit: default_message_limit(),
            window_secs: default_window_secs(),
        }
    }
}

/// GM narration scene script: the fragments streamed to clients and the
/// final merged payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GmConfig {
    /// Narration fragments emitted in order before the final payload.
    #[serde(default = "default_gm_chunks")]
    pub chunks: Vec<String>,

    /// Final narration text merged into the story state.
    #[serde(default = "default_gm_narration")]
    pub narration: String,

    /// Public hints merged into the story state with the narration.
    #[serde(default = "default_gm_public_hints")]
    pub public_hints: Vec<String>,

    /// Delay between fragments in milliseconds (simulated generation latency).
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
}

impl Default for GmConfig {
    fn default() -> Self {
        Self {
            chunks: default_gm_chunks(),
            narration: default_gm_narration(),
            public_hints: default_gm_public_hints(),
            chunk_delay_ms: default_chunk_delay_ms(),
        }
    }
}

fn default_service_name() -> String {
    "arcane-relay".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8470
}

fn default_database_path() -> String {
    "arcane.db".to_string()
}

fn default_command_limit() -> u32 {
    60
}

fn default_message_limit() -> u32 {
    120
}

fn default_window_secs() -> u64 {
    60
}

fn default_gm_chunks() -> Vec<String> {
    vec![
        "(the GM is typing…)".to_string(),
        "(a moment more…)".to_string(),
        "(almost there…)".to_string(),
    ]
}

fn default_gm_narration() -> String {
    "The door shudders. The sigils flare dimly.".to_string()
}

fn default_gm_public_hints() -> Vec<String> {
    vec!["The order of the symbols matters".to_string()]
}

fn default_chunk_delay_ms() -> u64 {
    500
}
