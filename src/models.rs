//! Core data types: chat messages and their derived vector records

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::MAX_MESSAGE_LENGTH;
use crate::MIN_MESSAGE_LENGTH;

/// A chat message row as owned by the message store.
///
/// Messages are append-mostly; edits touch `content` and `updated_at` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: Uuid,
    pub channel_id: Uuid,
    pub network_id: Uuid,
    pub created_by: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: MessageMeta,
}

/// Structured metadata bag attached to a message.
///
/// Bot replies carry `is_bot = true` and point back at the message that
/// triggered them via `in_response_to`. Unknown keys are preserved so the
/// store's own metadata survives a round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMeta {
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<Uuid>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MessageMeta {
    /// Metadata for a bot reply to `trigger_id`
    #[must_use]
    pub fn bot_reply(trigger_id: Uuid) -> Self {
        Self {
            is_bot: true,
            in_response_to: Some(trigger_id),
            extra: serde_json::Map::new(),
        }
    }
}

impl Message {
    /// Build an ephemeral trigger message for a query that was not (or not
    /// knowably) persisted. The caller may pass the id of the stored trigger
    /// so self-exclusion can match it; otherwise a fresh id is synthesized
    /// and exclusion-by-id never fires.
    #[must_use]
    pub fn trigger(
        network_id: Uuid,
        channel_id: Uuid,
        message_id: Option<Uuid>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.unwrap_or_else(Uuid::new_v4),
            channel_id,
            network_id,
            created_by: Uuid::nil(),
            content: content.into(),
            created_at: Utc::now(),
            updated_at: None,
            meta: MessageMeta::default(),
        }
    }
}

/// Denormalized metadata snapshot stored alongside each vector.
///
/// Carries everything needed to filter and render a match without a join
/// back to the message store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub message_id: Uuid,
    pub channel_id: Uuid,
    pub network_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub content: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub in_response_to: Option<Uuid>,
}

impl From<&Message> for VectorMetadata {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.message_id,
            channel_id: message.channel_id,
            network_id: message.network_id,
            created_by: message.created_by,
            created_at: message.created_at,
            updated_at: message.updated_at,
            content: message.content.clone(),
            is_bot: message.meta.is_bot,
            in_response_to: message.meta.in_response_to,
        }
    }
}

/// A vector record derived from a message, keyed 1:1 by `message_id`.
///
/// Created or overwritten only by a sync run; re-syncing the same message
/// replaces the record rather than duplicating it.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub message_id: Uuid,
    pub vector: Vec<f32>,
    pub metadata: VectorMetadata,
}

impl VectorRecord {
    /// Snapshot a message into an index record with its embedding
    #[must_use]
    pub fn from_message(message: &Message, vector: Vec<f32>) -> Self {
        Self {
            message_id: message.message_id,
            vector,
            metadata: VectorMetadata::from(message),
        }
    }
}

/// A similarity match returned by the vector index.
///
/// Scores are "higher = more similar"; thresholding and ranking policy is
/// applied by the context assembler, not here.
#[derive(Debug, Clone)]
pub struct SimilarMatch {
    pub id: Uuid,
    pub score: f32,
    pub metadata: VectorMetadata,
}

/// Validate message content length (1-2000 characters)
pub fn validate_content(content: &str) -> Result<()> {
    let length = content.chars().count();
    if length < MIN_MESSAGE_LENGTH {
        return Err(ChatRagError::Validation(
            "message content must not be empty".to_string(),
        ));
    }
    if length > MAX_MESSAGE_LENGTH {
        return Err(ChatRagError::Validation(format!(
            "message content exceeds {MAX_MESSAGE_LENGTH} characters ({length})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content_bounds() {
        assert!(validate_content("x").is_ok());
        assert!(validate_content(&"x".repeat(MAX_MESSAGE_LENGTH)).is_ok());
        assert!(validate_content("").is_err());
        assert!(validate_content(&"x".repeat(MAX_MESSAGE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_content_counts_chars_not_bytes() {
        // 2000 multi-byte characters are within the limit even though the
        // byte length is larger
        let content = "\u{e9}".repeat(MAX_MESSAGE_LENGTH);
        assert!(content.len() > MAX_MESSAGE_LENGTH);
        assert!(validate_content(&content).is_ok());
    }

    #[test]
    fn test_vector_metadata_snapshot() {
        let mut message = Message::trigger(Uuid::new_v4(), Uuid::new_v4(), None, "hello");
        message.meta = MessageMeta::bot_reply(Uuid::new_v4());

        let metadata = VectorMetadata::from(&message);
        assert_eq!(metadata.message_id, message.message_id);
        assert_eq!(metadata.content, "hello");
        assert!(metadata.is_bot);
        assert_eq!(metadata.in_response_to, message.meta.in_response_to);
    }

    #[test]
    fn test_message_meta_round_trips_unknown_keys() {
        let raw = serde_json::json!({
            "is_bot": false,
            "payloads": ["a.png"],
        });
        let meta: MessageMeta = serde_json::from_value(raw).unwrap();
        assert!(!meta.is_bot);
        assert!(meta.extra.contains_key("payloads"));

        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["payloads"][0], "a.png");
    }

    #[test]
    fn test_trigger_uses_caller_id_when_given() {
        let id = Uuid::new_v4();
        let message = Message::trigger(Uuid::new_v4(), Uuid::new_v4(), Some(id), "q");
        assert_eq!(message.message_id, id);
        assert!(!message.meta.is_bot);
    }
}
