// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response types for the callable command endpoints.
//!
//! Shared between the server handlers and the client API wrappers so both
//! sides validate against the same schema. Validation happens before any
//! mutation server-side and before any request client-side.

use serde::{Deserialize, Serialize};

use crate::code::CODE_LENGTH;
use crate::error::ArcaneError;

/// Bounds for a player display name.
const DISPLAY_NAME_MIN: usize = 2;
const DISPLAY_NAME_MAX: usize = 50;

/// Bounds for a chat message body.
const MESSAGE_TEXT_MAX: usize = 2000;

fn require_display_name(name: &str) -> Result<(), ArcaneError> {
    let len = name.chars().count();
    if !(DISPLAY_NAME_MIN..=DISPLAY_NAME_MAX).contains(&len) {
        return Err(ArcaneError::InvalidArgument(format!(
            "displayName must be {DISPLAY_NAME_MIN}-{DISPLAY_NAME_MAX} characters"
        )));
    }
    Ok(())
}

fn require_session_id(session_id: &str) -> Result<(), ArcaneError> {
    if session_id.is_empty() {
        return Err(ArcaneError::InvalidArgument(
            "sessionId must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub display_name: String,
}

impl CreateSessionRequest {
    pub fn validate(&self) -> Result<(), ArcaneError> {
        require_display_name(&self.display_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionRequest {
    pub code: String,
    pub display_name: String,
}

impl JoinSessionRequest {
    pub fn validate(&self) -> Result<(), ArcaneError> {
        if self.code.chars().count() != CODE_LENGTH {
            return Err(ArcaneError::InvalidArgument(format!(
                "code must be exactly {CODE_LENGTH} characters"
            )));
        }
        require_display_name(&self.display_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub session_id: String,
}

impl StartSessionRequest {
    pub fn validate(&self) -> Result<(), ArcaneError> {
        require_session_id(&self.session_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub session_id: String,
    pub text: String,
}

impl SendMessageRequest {
    pub fn validate(&self) -> Result<(), ArcaneError> {
        require_session_id(&self.session_id)?;
        let len = self.text.chars().count();
        if len == 0 || len > MESSAGE_TEXT_MAX {
            return Err(ArcaneError::InvalidArgument(format!(
                "text must be 1-{MESSAGE_TEXT_MAX} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePuzzleRequest {
    pub session_id: String,
    pub answer: String,
}

impl ValidatePuzzleRequest {
    pub fn validate(&self) -> Result<(), ArcaneError> {
        require_session_id(&self.session_id)?;
        if self.answer.is_empty() {
            return Err(ArcaneError::InvalidArgument(
                "answer must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePuzzleResponse {
    pub correct: bool,
}

/// Empty JSON body returned by commands with no payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyResponse {}

/// Response from anonymous sign-in: a fresh identity and its bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousAuthResponse {
    pub user_id: String,
    pub token: String,
}
