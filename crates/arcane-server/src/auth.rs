// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication for the command endpoints.
//!
//! Players sign in anonymously: `POST /v1/auth/anonymous` mints a fresh
//! user id and a bearer token of the form `"{userId}.{hex(hmac)}"`, where
//! the HMAC-SHA256 is computed over the user id with the server secret.
//! The middleware verifies the token on every command request and injects
//! the caller's [`Identity`] into request extensions.
//!
//! When no secret is configured, all requests are rejected (fail-closed).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use arcane_core::ArcaneError;

use crate::handlers::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Authentication configuration for the service.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret. Empty means auth is unconfigured and all requests fail.
    secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &if self.secret.is_empty() { "[unset]" } else { "[redacted]" })
            .finish()
    }
}

/// The authenticated caller, injected into request extensions by the
/// middleware.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

impl AuthConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Whether a secret is configured.
    pub fn enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    fn mac(&self, user_id: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(user_id.as_bytes());
        mac
    }

    /// Mints a bearer token for `user_id`.
    pub fn mint(&self, user_id: &str) -> Result<String, ArcaneError> {
        if !self.enabled() {
            return Err(ArcaneError::Internal(
                "auth secret is not configured".to_string(),
            ));
        }
        let signature = hex::encode(self.mac(user_id).finalize().into_bytes());
        Ok(format!("{user_id}.{signature}"))
    }

    /// Verifies a bearer token, returning the embedded user id.
    ///
    /// Signature comparison is constant-time via `Mac::verify_slice`.
    pub fn verify(&self, token: &str) -> Option<String> {
        if !self.enabled() {
            return None;
        }
        let (user_id, signature_hex) = token.rsplit_once('.')?;
        if user_id.is_empty() {
            return None;
        }
        let signature = hex::decode(signature_hex).ok()?;
        self.mac(user_id).verify_slice(&signature).ok()?;
        Some(user_id.to_string())
    }
}

/// Middleware that validates the bearer token and attaches [`Identity`].
///
/// With no secret configured, every request is rejected (fail-closed).
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !auth.enabled() {
        tracing::error!("no auth secret configured -- rejecting request");
        return Err(ApiError(ArcaneError::Unauthenticated));
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(user_id) = token.and_then(|t| auth.verify(t)) else {
        return Err(ApiError(ArcaneError::Unauthenticated));
    };

    request.extensions_mut().insert(Identity(user_id));
    Ok(next.run(request).await)
}
