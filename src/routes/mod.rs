//! API routes
//!
//! The text I/O surface: one endpoint opens a session, one feeds it a turn.
//! A session is taken out of the shared map while its turn runs, so a single
//! conversation is never mutated concurrently; distinct sessions proceed in
//! parallel. Ended sessions are dropped.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::{DialogueEngine, Phase, Session, TurnOutcome};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DialogueEngine>,
    pub sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl AppState {
    pub fn new(engine: Arc<DialogueEngine>) -> Self {
        Self {
            engine,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    session_id: Uuid,
    reply: String,
    phase: Phase,
}

#[derive(Debug, Deserialize)]
struct TurnRequest {
    utterance: String,
}

#[derive(Debug, Serialize)]
struct TurnResponse {
    reply: String,
    phase: Phase,
    ended: bool,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn open_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.engine.open_session();
    let response = SessionResponse {
        session_id: session.id,
        reply: state.engine.greeting().to_string(),
        phase: session.phase,
    };

    state.sessions.lock().await.insert(session.id, session);
    tracing::info!(session_id = %response.session_id, "session opened");
    Json(response)
}

async fn take_turn(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, StatusCode> {
    // Take the session out for the duration of the turn.
    let mut session = state
        .sessions
        .lock()
        .await
        .remove(&session_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    let result = state.engine.take_turn(&mut session, &request.utterance).await;
    let phase = session.phase;
    let ended = result.outcome == TurnOutcome::Ended;

    if ended {
        tracing::info!(session_id = %session_id, "session ended");
    } else {
        state.sessions.lock().await.insert(session_id, session);
    }

    Ok(Json(TurnResponse {
        reply: result.reply,
        phase,
        ended,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/sessions", post(open_session))
        .route("/v1/sessions/:id/turns", post(take_turn))
}
