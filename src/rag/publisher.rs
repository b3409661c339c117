//! Publishing generated replies back into the message store

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::models::Message;
use crate::models::MessageMeta;
use crate::store::MessageStore;
use crate::sync::SyncCoordinator;
use crate::MAX_MESSAGE_LENGTH;

/// Persists a generated reply as a flagged bot message and syncs it.
///
/// Create failure fails the whole query closed: a generated-but-unpersisted
/// reply is never surfaced as sent. The follow-up sync cannot fail the
/// publish - the coordinator swallows its own errors - and only makes the
/// reply searchable. The publisher re-enters the sync coordinator, never
/// the query pipeline, so a bot reply cannot trigger another query cycle.
pub struct ResponsePublisher {
    store: Arc<dyn MessageStore>,
    sync: Arc<SyncCoordinator>,
    bot_account_id: Uuid,
}

impl ResponsePublisher {
    pub fn new(
        store: Arc<dyn MessageStore>,
        sync: Arc<SyncCoordinator>,
        bot_account_id: Uuid,
    ) -> Self {
        Self {
            store,
            sync,
            bot_account_id,
        }
    }

    /// Create the reply message and sync it into the vector index
    pub async fn publish(&self, trigger: &Message, text: &str) -> Result<Message> {
        // The store enforces the channel content limit; clip rather than
        // bounce an overlong completion
        let content: String = text.chars().take(MAX_MESSAGE_LENGTH).collect();

        let reply = self
            .store
            .create_message(
                trigger.channel_id,
                self.bot_account_id,
                &content,
                MessageMeta::bot_reply(trigger.message_id),
            )
            .await
            .map_err(|e| ChatRagError::Publish(e.to_string()))?;

        let outcome = self.sync.sync_message(&reply).await;
        debug!(
            reply_id = %reply.message_id,
            trigger_id = %trigger.message_id,
            "Published bot reply (sync outcome: {outcome:?})"
        );

        Ok(reply)
    }
}
