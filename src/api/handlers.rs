//! API request handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;
use tracing::info;

use crate::api::types::AskResponse;
use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::api::types::MatchResult;
use crate::api::types::QueryRequest;
use crate::api::types::SimilarResponse;
use crate::api::types::SyncAccepted;
use crate::errors::ChatRagError;
use crate::models::validate_content;
use crate::models::Message;
use crate::rag::AskPipeline;
use crate::sync::SyncCoordinator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AskPipeline>,
    pub sync: Arc<SyncCoordinator>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a pipeline error onto the uniform failure envelope
fn error_response(err: &ChatRagError) -> ApiError {
    let status = match err {
        ChatRagError::Validation(_) => StatusCode::BAD_REQUEST,
        ChatRagError::Scope(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(err.to_string())))
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Sync a message into the vector index (POST /api/messages/sync).
///
/// Fire-and-forget: the sync runs detached so the caller that just created
/// the message is never blocked or failed by index trouble.
pub async fn sync_message(
    State(state): State<AppState>,
    Json(message): Json<Message>,
) -> Result<Json<SyncAccepted>, ApiError> {
    info!("POST /api/messages/sync: {}", message.message_id);

    validate_content(&message.content).map_err(|e| error_response(&e))?;

    // The handle is dropped on purpose: the spawned task logs its own outcome
    let _handle = state.sync.spawn_sync(message);
    Ok(Json(SyncAccepted { success: true }))
}

/// Answer a query and publish the bot reply (POST /api/messages/ask)
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    info!("POST /api/messages/ask in channel {}", req.channel_id);

    let trigger = Message::trigger(req.network_id, req.channel_id, req.message_id, req.content);

    match state.pipeline.ask(&trigger).await {
        Ok(outcome) => Ok(Json(AskResponse {
            success: true,
            response: outcome.answer,
        })),
        Err(e) => {
            error!("Error processing ask query: {}", e);
            Err(error_response(&e))
        }
    }
}

/// Browse similar messages without publishing (POST /api/messages/similar)
pub async fn similar(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<SimilarResponse>, ApiError> {
    info!("POST /api/messages/similar in channel {}", req.channel_id);

    let trigger = Message::trigger(req.network_id, req.channel_id, req.message_id, req.content);

    match state.pipeline.similar(&trigger).await {
        Ok(outcome) => Ok(Json(SimilarResponse {
            success: true,
            results: outcome.matches.iter().map(MatchResult::from).collect(),
            response: outcome.answer,
        })),
        Err(e) => {
            error!("Error processing similarity query: {}", e);
            Err(error_response(&e))
        }
    }
}
