// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Arcane Relay service.
//!
//! Layered loading (defaults, system/user/local TOML, `ARCANE_` env vars)
//! followed by a collect-all semantic validation pass.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ArcaneConfig;
pub use validation::validate_config;

/// Load configuration from the standard hierarchy and validate it.
///
/// Returns all load/validation errors together rather than failing fast.
pub fn load_and_validate() -> Result<ArcaneConfig, Vec<ConfigError>> {
    let config = load_config().map_err(|e| vec![ConfigError::Load(Box::new(e))])?;
    validate_config(&config)?;
    Ok(config)
}
