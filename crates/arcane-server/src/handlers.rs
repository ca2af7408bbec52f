// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the command endpoints.
//!
//! Every command follows the same order: rate limit (keyed by caller
//! identity) -> schema validation -> store mutation. Validation failures
//! happen before any write, so invalid input never leaves partial state.

use std::net::SocketAddr;

use axum::{
    Extension, Json,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use arcane_core::commands::{
    AnonymousAuthResponse, CreateSessionRequest, CreateSessionResponse, EmptyResponse,
    JoinSessionRequest, JoinSessionResponse, SendMessageRequest, StartSessionRequest,
    ValidatePuzzleRequest, ValidatePuzzleResponse,
};
use arcane_core::time::now_millis;
use arcane_core::{
    ArcaneError, AuthorKind, Message, Player, Session, SessionStatus, StoryState, player_doc_id,
};
use arcane_store::decode_document;

use crate::auth::Identity;
use crate::codegen::generate_session_code;
use crate::puzzle;
use crate::server::AppState;

/// Wrapper mapping [`ArcaneError`] onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub ArcaneError);

impl From<ArcaneError> for ApiError {
    fn from(err: ArcaneError) -> Self {
        Self(err)
    }
}

/// JSON error body: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let (status, message) = match code {
            "unauthenticated" => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            "invalid-argument" => (StatusCode::BAD_REQUEST, self.0.to_string()),
            "resource-exhausted" => (StatusCode::TOO_MANY_REQUESTS, self.0.to_string()),
            "not-found" => (StatusCode::NOT_FOUND, self.0.to_string()),
            "permission-denied" => (StatusCode::FORBIDDEN, self.0.to_string()),
            // Infrastructure details stay out of responses.
            _ => {
                tracing::error!(error = %self.0, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        let body = Json(ErrorBody {
            error: ErrorDetail { code, message },
        });
        (status, body).into_response()
    }
}

/// Response body for GET /v1/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /v1/health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

/// POST /v1/auth/anonymous
///
/// Mints a fresh anonymous identity and its bearer token. Rate-limited by
/// peer address since there is no identity yet.
pub async fn post_anonymous(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Json<AnonymousAuthResponse>, ApiError> {
    state
        .limiter
        .check(&addr.ip().to_string(), state.command_policy)?;
    let user_id = uuid::Uuid::new_v4().to_string();
    let token = state.auth.mint(&user_id)?;
    Ok(Json(AnonymousAuthResponse { user_id, token }))
}

/// POST /v1/sessions
///
/// Allocates a session in lobby status, the caller's owner player record,
/// and an empty story state. The three writes are an ordered sequence, not
/// a transaction: a crash in between can orphan the session (see DESIGN.md).
pub async fn create_session(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    state.limiter.check(&identity.0, state.command_policy)?;
    body.validate()?;

    let code = generate_session_code(&state.store).await?;
    let now = now_millis();
    let session_id = uuid::Uuid::new_v4().to_string();

    let session = Session {
        id: session_id.clone(),
        code: code.clone(),
        status: SessionStatus::Lobby,
        owner_id: identity.0.clone(),
        created_at: Some(now),
    };
    state.store.create_session(&session).await?;

    let owner = Player {
        id: player_doc_id(&session_id, &identity.0),
        session_id: session_id.clone(),
        user_id: identity.0.clone(),
        display_name: body.display_name,
        is_owner: true,
        joined_at: now,
    };
    state.store.upsert_player(&owner).await?;

    state
        .store
        .create_story_state(&StoryState::empty(session_id.clone(), now))
        .await?;

    tracing::info!(session_id = %session_id, code = %code, "session created");
    Ok(Json(CreateSessionResponse { session_id, code }))
}

/// POST /v1/sessions/join
///
/// Idempotent: a re-join by the same caller merges into the existing
/// player record, updating the display name.
pub async fn join_session(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<JoinSessionRequest>,
) -> Result<Json<JoinSessionResponse>, ApiError> {
    state.limiter.check(&identity.0, state.command_policy)?;
    body.validate()?;

    let Some(doc) = state.store.find_session_by_code(&body.code).await? else {
        return Err(ArcaneError::NotFound("session not found".to_string()).into());
    };
    let session: Session = decode_document(doc)?;

    let player = Player {
        id: player_doc_id(&session.id, &identity.0),
        session_id: session.id.clone(),
        user_id: identity.0.clone(),
        display_name: body.display_name,
        is_owner: session.owner_id == identity.0,
        joined_at: now_millis(),
    };
    state.store.upsert_player(&player).await?;

    Ok(Json(JoinSessionResponse {
        session_id: session.id,
    }))
}

/// POST /v1/sessions/start
///
/// Owner-only lobby -> active transition. Re-starting an already-active
/// session is an idempotent no-op write.
pub async fn start_session(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<StartSessionRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.limiter.check(&identity.0, state.command_policy)?;
    body.validate()?;

    let Some(doc) = state.store.get_session(&body.session_id).await? else {
        return Err(ArcaneError::NotFound("session not found".to_string()).into());
    };
    let session: Session = decode_document(doc)?;
    if session.owner_id != identity.0 {
        return Err(
            ArcaneError::PermissionDenied("only the owner can start the session".to_string())
                .into(),
        );
    }

    state
        .store
        .merge_session(&body.session_id, serde_json::json!({"status": "active"}))
        .await?;

    Ok(Json(EmptyResponse {}))
}

/// POST /v1/messages
///
/// Appends a player message. No session existence check: the append is
/// fire-and-forget relative to session state.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.limiter.check(&identity.0, state.message_policy)?;
    body.validate()?;

    let message = Message {
        id: uuid::Uuid::new_v4().to_string(),
        session_id: body.session_id,
        author: AuthorKind::Player,
        player_id: Some(identity.0.clone()),
        text: body.text,
        created_at: now_millis(),
    };
    state.store.append_message(&message).await?;

    Ok(Json(EmptyResponse {}))
}

/// POST /v1/puzzles/validate
///
/// Normalizes the answer and checks it against the puzzle table. A correct
/// answer merges the puzzle's flag into the story state; a wrong answer
/// mutates nothing.
pub async fn validate_puzzle(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<ValidatePuzzleRequest>,
) -> Result<Json<ValidatePuzzleResponse>, ApiError> {
    state.limiter.check(&identity.0, state.command_policy)?;
    body.validate()?;

    let Some(puzzle) = puzzle::match_puzzle(&body.answer) else {
        return Ok(Json(ValidatePuzzleResponse { correct: false }));
    };

    let mut flags = serde_json::Map::new();
    flags.insert(puzzle.flag.to_string(), serde_json::Value::Bool(true));
    state
        .store
        .merge_story_state(&body.session_id, serde_json::json!({"flags": flags}))
        .await?;

    tracing::debug!(session_id = %body.session_id, puzzle = puzzle.id, "puzzle solved");
    Ok(Json(ValidatePuzzleResponse { correct: true }))
}
