// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Arcane Relay session service.

use thiserror::Error;

/// The primary error type used across the Arcane Relay workspace.
///
/// The first six variants form the caller-visible taxonomy; each maps to a
/// stable wire code via [`ArcaneError::code`]. `Storage` and `Stream` wrap
/// infrastructure failures and surface to callers as `internal`.
#[derive(Debug, Error)]
pub enum ArcaneError {
    /// No caller identity (missing or invalid bearer token).
    #[error("authentication required")]
    Unauthenticated,

    /// Input failed schema validation before any mutation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Caller exceeded a rate-limit window.
    #[error("too many requests")]
    ResourceExhausted,

    /// Requested session or entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller attempted an owner-only action without owning the session.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Storage backend errors (database connection, query failure, corrupt document).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Stream transport errors (connection failure, malformed event payload).
    #[error("stream error: {message}")]
    Stream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors (e.g. exhausted retry budget).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ArcaneError {
    /// Stable wire code for this error, as surfaced in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ArcaneError::Unauthenticated => "unauthenticated",
            ArcaneError::InvalidArgument(_) => "invalid-argument",
            ArcaneError::ResourceExhausted => "resource-exhausted",
            ArcaneError::NotFound(_) => "not-found",
            ArcaneError::PermissionDenied(_) => "permission-denied",
            ArcaneError::Storage { .. }
            | ArcaneError::Stream { .. }
            | ArcaneError::Internal(_) => "internal",
        }
    }

    /// Reconstructs a caller-visible variant from a wire code and message.
    ///
    /// Used by the client to map JSON error bodies back into typed errors.
    /// Unknown codes fold into `Internal`.
    pub fn from_code(code: &str, message: &str) -> Self {
        match code {
            "unauthenticated" => ArcaneError::Unauthenticated,
            "invalid-argument" => ArcaneError::InvalidArgument(message.to_string()),
            "resource-exhausted" => ArcaneError::ResourceExhausted,
            "not-found" => ArcaneError::NotFound(message.to_string()),
            "permission-denied" => ArcaneError::PermissionDenied(message.to_string()),
            _ => ArcaneError::Internal(message.to_string()),
        }
    }
}
