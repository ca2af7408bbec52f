// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration error types and terminal rendering.

use thiserror::Error;

/// An error produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment failed to read or merge a config source.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A semantic constraint was violated after deserialization.
    #[error("{message}")]
    Validation { message: String },
}

/// Print collected configuration errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    eprintln!("arcane: invalid configuration:");
    for error in errors {
        eprintln!("  - {error}");
    }
}
