// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty paths, and sane
//! rate-limit policies.

use crate::diagnostic::ConfigError;
use crate::model::ArcaneConfig;

/// Minimum length for a non-empty auth secret.
const MIN_SECRET_LEN: usize = 16;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ArcaneConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate host is not empty and looks like an IP or hostname.
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    // Validate database_path is not empty.
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // An empty secret fails closed at runtime; a short one is a misconfiguration.
    let secret_len = config.server.auth_secret.len();
    if secret_len > 0 && secret_len < MIN_SECRET_LEN {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.auth_secret must be at least {MIN_SECRET_LEN} bytes, got {secret_len}"
            ),
        });
    }

    // Rate-limit policies must permit at least one request.
    if config.limits.command_limit < 1 {
        errors.push(ConfigError::Validation {
            message: "limits.command_limit must be at least 1".to_string(),
        });
    }
    if config.limits.message_limit < 1 {
        errors.push(ConfigError::Validation {
            message: "limits.message_limit must be at least 1".to_string(),
        });
    }
    if config.limits.window_secs < 1 {
        errors.push(ConfigError::Validation {
            message: "limits.window_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
