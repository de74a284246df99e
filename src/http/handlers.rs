use super::state::AppState;
use crate::connector::NatsConnector;
use crate::error::SessionError;
use crate::session::{InterviewConfig, SessionStatus, Stage, TranscriptEntry};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    pub job_title: String,

    pub job_description: String,

    /// Requested duration in seconds; silently clamped into the
    /// configured [min, max] range. Read the effective value back from
    /// the response.
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: String,
    pub stage: Stage,
    pub scheduled_duration_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct EndInterviewResponse {
    pub session_id: String,
    pub status: SessionStatus,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(err: &SessionError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        SessionError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::DuplicateSession(_) | SessionError::AlreadyStarted(_) => {
            StatusCode::CONFLICT
        }
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::ConnectorInit(_) => StatusCode::BAD_GATEWAY,
        SessionError::SessionLive(_) => StatusCode::CONFLICT,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews/start
/// Create and start a new interview session
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> impl IntoResponse {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("interview-{}", uuid::Uuid::new_v4()));

    info!("Starting interview session: {}", session_id);

    let config = match InterviewConfig::resolve(
        session_id.clone(),
        &state.defaults,
        &req.job_title,
        &req.job_description,
        req.duration_secs,
    ) {
        Ok(config) => config,
        Err(e) => {
            error!("Rejected interview config: {}", e);
            return error_response(&e).into_response();
        }
    };

    let connector = Box::new(NatsConnector::new(state.nats_url.clone(), session_id.clone()));

    let session = match state.registry.create(config, connector).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to register session: {}", e);
            return error_response(&e).into_response();
        }
    };

    if let Err(e) = session.start().await {
        error!("Failed to start session: {}", e);
        // The failed session is terminal; reap it so the id slot is
        // not left occupied by a husk.
        if let Err(remove_err) = state.registry.remove(&session_id).await {
            error!("Failed to remove dead session: {}", remove_err);
        }
        return error_response(&e).into_response();
    }

    info!("Interview started successfully: {}", session_id);

    (
        StatusCode::OK,
        Json(StartInterviewResponse {
            session_id,
            stage: session.stage().await,
            scheduled_duration_secs: session.config().scheduled_duration_secs,
        }),
    )
        .into_response()
}

/// POST /interviews/:session_id/end
/// Finish an interview with the standard closing
pub async fn end_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Ending interview session: {}", session_id);

    let session = match state.registry.get(&session_id).await {
        Ok(session) => session,
        Err(e) => return error_response(&e).into_response(),
    };

    session.end().await;
    session.wait_completed().await;

    (
        StatusCode::OK,
        Json(EndInterviewResponse {
            session_id,
            status: session.status().await,
        }),
    )
        .into_response()
}

/// GET /interviews/:session_id/status
/// Read-only status; valid at any time, including post-completion
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.registry.get(&session_id).await {
        Ok(session) => (StatusCode::OK, Json(session.status().await)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET /interviews/:session_id/transcript
/// Transcript snapshot accumulated so far
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.registry.get(&session_id).await {
        Ok(session) => {
            let transcript: Vec<TranscriptEntry> = session.transcript().await;
            (StatusCode::OK, Json(transcript)).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
