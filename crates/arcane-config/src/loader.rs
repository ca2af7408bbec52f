// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./arcane.toml` > `~/.config/arcane/arcane.toml` >
//! `/etc/arcane/arcane.toml` with environment variable overrides via the
//! `ARCANE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ArcaneConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/arcane/arcane.toml` (system-wide)
/// 3. `~/.config/arcane/arcane.toml` (user XDG config)
/// 4. `./arcane.toml` (local directory)
/// 5. `ARCANE_*` environment variables
pub fn load_config() -> Result<ArcaneConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArcaneConfig::default()))
        .merge(Toml::file("/etc/arcane/arcane.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("arcane/arcane.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("arcane.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ArcaneConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArcaneConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ArcaneConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArcaneConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `ARCANE_SERVER_AUTH_SECRET` must map to
/// `server.auth_secret`, not `server.auth.secret`.
fn env_provider() -> Env {
    Env::prefixed("ARCANE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: ARCANE_SERVER_AUTH_SECRET -> "server_auth_secret"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("limits_", "limits.", 1)
            .replacen("gm_", "gm.", 1);
        mapped.into()
    })
}
