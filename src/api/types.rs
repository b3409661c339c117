//! API request and response types

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::models::SimilarMatch;

/// Query request for the ask and similar endpoints.
///
/// `message_id` optionally names the already-persisted triggering message
/// so the pipeline can exclude it from its own similarity results.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub network_id: Uuid,
    pub channel_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}

/// Successful ask response
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub success: bool,
    pub response: String,
}

/// Successful similarity-browsing response
#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub success: bool,
    pub results: Vec<MatchResult>,
    pub response: String,
}

/// Acknowledgement for an accepted sync request
#[derive(Debug, Serialize)]
pub struct SyncAccepted {
    pub success: bool,
}

/// Uniform failure envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// One similarity match rendered for the API
#[derive(Debug, Serialize)]
pub struct MatchResult {
    pub score: f32,
    pub message: MessageExcerpt,
}

/// Match metadata rendered as a message excerpt
#[derive(Debug, Serialize)]
pub struct MessageExcerpt {
    pub message_id: Uuid,
    pub channel_id: Uuid,
    pub content: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&SimilarMatch> for MatchResult {
    fn from(m: &SimilarMatch) -> Self {
        Self {
            score: m.score,
            message: MessageExcerpt {
                message_id: m.metadata.message_id,
                channel_id: m.metadata.channel_id,
                content: m.metadata.content.clone(),
                created_by: m.metadata.created_by,
                created_at: m.metadata.created_at,
                updated_at: m.metadata.updated_at,
            },
        }
    }
}
