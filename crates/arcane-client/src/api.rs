// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed client for the command endpoints.
//!
//! Requests are validated locally against the shared schemas before
//! anything goes on the wire, and JSON error bodies decode back into
//! [`ArcaneError`] variants so callers see the same taxonomy the server
//! raised.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use arcane_core::ArcaneError;
use arcane_core::commands::{
    AnonymousAuthResponse, CreateSessionRequest, CreateSessionResponse, EmptyResponse,
    JoinSessionRequest, JoinSessionResponse, SendMessageRequest, StartSessionRequest,
    ValidatePuzzleRequest, ValidatePuzzleResponse,
};

/// HTTP client for the Arcane Relay command API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for the service at `base_url` (no trailing slash
    /// required).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ArcaneError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ArcaneError::Stream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attaches a bearer token to all subsequent requests.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Signs in anonymously, storing the minted token on this client.
    pub async fn sign_in_anonymously(&mut self) -> Result<AnonymousAuthResponse, ArcaneError> {
        let auth: AnonymousAuthResponse = self
            .post("/v1/auth/anonymous", &serde_json::json!({}))
            .await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    /// createSession{displayName} -> {sessionId, code}
    pub async fn create_session(
        &self,
        display_name: impl Into<String>,
    ) -> Result<CreateSessionResponse, ArcaneError> {
        let request = CreateSessionRequest {
            display_name: display_name.into(),
        };
        request.validate()?;
        self.post("/v1/sessions", &request).await
    }

    /// joinSessionByCode{code, displayName} -> {sessionId}
    pub async fn join_session(
        &self,
        code: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<JoinSessionResponse, ArcaneError> {
        let request = JoinSessionRequest {
            code: code.into(),
            display_name: display_name.into(),
        };
        request.validate()?;
        self.post("/v1/sessions/join", &request).await
    }

    /// startSession{sessionId} -> {}
    pub async fn start_session(&self, session_id: impl Into<String>) -> Result<(), ArcaneError> {
        let request = StartSessionRequest {
            session_id: session_id.into(),
        };
        request.validate()?;
        let _: EmptyResponse = self.post("/v1/sessions/start", &request).await?;
        Ok(())
    }

    /// sendMessage{sessionId, text} -> {}
    pub async fn send_message(
        &self,
        session_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), ArcaneError> {
        let request = SendMessageRequest {
            session_id: session_id.into(),
            text: text.into(),
        };
        request.validate()?;
        let _: EmptyResponse = self.post("/v1/messages", &request).await?;
        Ok(())
    }

    /// validatePuzzle{sessionId, answer} -> correct
    pub async fn validate_puzzle(
        &self,
        session_id: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<bool, ArcaneError> {
        let request = ValidatePuzzleRequest {
            session_id: session_id.into(),
            answer: answer.into(),
        };
        request.validate()?;
        let response: ValidatePuzzleResponse = self.post("/v1/puzzles/validate", &request).await?;
        Ok(response.correct)
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ArcaneError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut request = self.http.post(format!("{}{path}", self.base_url)).json(body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ArcaneError::Stream {
            message: format!("request to {path} failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(|e| ArcaneError::Stream {
                message: format!("failed to decode response from {path}: {e}"),
                source: Some(Box::new(e)),
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(decode_error(status.as_u16(), &body))
        }
    }
}

/// Maps a JSON error body back into the shared taxonomy.
///
/// Bodies that are not the expected shape fold into a `Stream` error
/// carrying the status and raw text.
fn decode_error(status: u16, body: &str) -> ArcaneError {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(code) = value["error"]["code"].as_str()
    {
        let message = value["error"]["message"].as_str().unwrap_or_default();
        return ArcaneError::from_code(code, message);
    }
    ArcaneError::Stream {
        message: format!("API returned {status}: {body}"),
        source: None,
    }
}
