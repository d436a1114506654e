use super::state::AppState;
use crate::control::run_ws_session;
use crate::correlate::CorrelateError;
use crate::protocol::Command;
use crate::store::TranscriptionRecord;
use axum::{
    extract::{rejection::JsonRejection, ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitTranscriptionRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitTranscriptionResponse {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub success: bool,
    pub transcription_active: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub success: bool,
    pub message: String,
    pub transcription: TranscriptionRecord,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub error: String,
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /ws
/// Upgrade to the control channel
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| run_ws_session(socket, registry))
}

/// POST /api/transcription
/// Store a transcription result and hand it to any waiting stop request
pub async fn submit_transcription(
    State(state): State<AppState>,
    body: Result<Json<SubmitTranscriptionRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(req)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid request body".to_string(),
            }),
        )
            .into_response();
    };

    let record = TranscriptionRecord::new(req.text);
    let timestamp = record.timestamp;
    info!(text = %record.text, "received transcription");

    state.log.append(record.clone()).await;
    state.correlator.publish(record).await;

    (
        StatusCode::OK,
        Json(SubmitTranscriptionResponse {
            success: true,
            timestamp,
        }),
    )
        .into_response()
}

/// GET /api/transcription
/// All stored transcriptions in insertion order
pub async fn list_transcriptions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.log.all().await)
}

/// POST /api/toggle
/// Flip the active flag and broadcast the matching command
pub async fn toggle_transcription(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.log.toggle_active();
    let command = if active { Command::Start } else { Command::Stop };
    state.broadcaster.broadcast(command).await;

    (
        StatusCode::OK,
        Json(ToggleResponse {
            success: true,
            transcription_active: active,
            message: format!(
                "Transcription {}",
                if active { "started" } else { "stopped" }
            ),
        }),
    )
}

/// POST /api/start
/// Broadcast a start command unconditionally
pub async fn start_transcription(State(state): State<AppState>) -> impl IntoResponse {
    state.broadcaster.broadcast(Command::Start).await;

    (
        StatusCode::OK,
        Json(StartResponse {
            success: true,
            message: "Transcription started".to_string(),
        }),
    )
}

/// POST /api/stop
/// Broadcast a stop command, then block on the next transcription record
pub async fn stop_transcription(State(state): State<AppState>) -> impl IntoResponse {
    state.broadcaster.broadcast(Command::Stop).await;

    match state.correlator.await_next(state.stop_timeout).await {
        Ok(record) => (
            StatusCode::OK,
            Json(StopResponse {
                success: true,
                message: "Transcription stopped".to_string(),
                transcription: record,
            }),
        )
            .into_response(),
        Err(CorrelateError::Timeout) => {
            warn!("no transcription arrived before the stop deadline");
            (
                StatusCode::REQUEST_TIMEOUT,
                Json(FailureResponse {
                    error: "Timeout waiting for transcription".to_string(),
                    success: false,
                }),
            )
                .into_response()
        }
        Err(CorrelateError::Busy) => (
            StatusCode::CONFLICT,
            Json(FailureResponse {
                error: "A stop request is already waiting for a transcription".to_string(),
                success: false,
            }),
        )
            .into_response(),
    }
}

/// Shared 405 response for unsupported verbs on the API routes
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "Method not allowed".to_string(),
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
