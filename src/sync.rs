//! Write-path synchronization of messages into the vector index
//!
//! Every created (or edited) message is pushed through here: embed the
//! content, snapshot the metadata, upsert keyed by `message_id`. The
//! coordinator never surfaces a failure to its caller - index
//! unavailability must not turn into a chat outage - so both failure legs
//! log and stop. Re-running for the same message overwrites the record.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;
use tracing::warn;

use crate::embeddings::Embedder;
use crate::index::VectorIndex;
use crate::models::Message;
use crate::models::VectorRecord;

/// What a sync run did; informational only, callers do not branch on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Record upserted
    Synced,
    /// Embedding failed; the record (if any) is left stale
    EmbeddingFailed,
    /// Upsert failed; the record (if any) is left stale
    UpsertFailed,
}

/// Drives message -> embedding -> upsert, idempotently
pub struct SyncCoordinator {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl SyncCoordinator {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Sync one message into the index.
    ///
    /// Best effort: failures are logged and swallowed. Safe to invoke twice
    /// for the same message id - the second run overwrites the record, which
    /// is how edits propagate. Bot-authored replies go through the same path
    /// so they are searchable too; nothing here ever re-enters the query
    /// pipeline.
    pub async fn sync_message(&self, message: &Message) -> SyncOutcome {
        let vector = match self.embedder.embed(&message.content).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(
                    message_id = %message.message_id,
                    "Skipping index sync, embedding failed: {e}"
                );
                return SyncOutcome::EmbeddingFailed;
            }
        };

        let record = VectorRecord::from_message(message, vector);
        if let Err(e) = self.index.upsert(record).await {
            warn!(
                message_id = %message.message_id,
                "Skipping index sync, upsert failed: {e}"
            );
            return SyncOutcome::UpsertFailed;
        }

        debug!(message_id = %message.message_id, "Message synced to vector index");
        SyncOutcome::Synced
    }

    /// Run a sync detached from the caller.
    ///
    /// The write path that creates messages fires this and moves on; the
    /// spawned task owns the message and logs its own outcome. The returned
    /// handle is only awaited by tests.
    pub fn spawn_sync(self: &Arc<Self>, message: Message) -> JoinHandle<SyncOutcome> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.sync_message(&message).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::tests::mocks::failing_embedder;
    use crate::tests::mocks::failing_index;
    use crate::tests::mocks::message_in;
    use crate::tests::mocks::MockEmbedder;
    use crate::tests::mocks::MockIndex;

    fn coordinator(
        embedder: Arc<MockEmbedder>,
        index: Arc<MockIndex>,
    ) -> Arc<SyncCoordinator> {
        Arc::new(SyncCoordinator::new(embedder, index))
    }

    #[tokio::test]
    async fn test_sync_upserts_record_with_metadata_snapshot() {
        let embedder = Arc::new(MockEmbedder::default());
        let index = Arc::new(MockIndex::default());
        let sync = coordinator(embedder, Arc::clone(&index));

        let message = message_in(Uuid::new_v4(), Uuid::new_v4(), "hello world");
        assert_eq!(sync.sync_message(&message).await, SyncOutcome::Synced);

        let records = index.records();
        assert_eq!(records.len(), 1);
        let record = &records[&message.message_id];
        assert_eq!(record.metadata.content, "hello world");
        assert_eq!(record.metadata.channel_id, message.channel_id);
    }

    #[tokio::test]
    async fn test_resync_overwrites_instead_of_duplicating() {
        let embedder = Arc::new(MockEmbedder::default());
        let index = Arc::new(MockIndex::default());
        let sync = coordinator(embedder, Arc::clone(&index));

        let mut message = message_in(Uuid::new_v4(), Uuid::new_v4(), "original");
        sync.sync_message(&message).await;

        message.content = "edited".to_string();
        message.updated_at = Some(chrono::Utc::now());
        sync.sync_message(&message).await;

        let records = index.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[&message.message_id].metadata.content, "edited");
    }

    #[tokio::test]
    async fn test_embedding_failure_is_swallowed() {
        let index = Arc::new(MockIndex::default());
        let sync = coordinator(failing_embedder(), Arc::clone(&index));

        let message = message_in(Uuid::new_v4(), Uuid::new_v4(), "hello");
        assert_eq!(
            sync.sync_message(&message).await,
            SyncOutcome::EmbeddingFailed
        );
        assert!(index.records().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_failure_is_swallowed() {
        let sync = coordinator(Arc::new(MockEmbedder::default()), failing_index());

        let message = message_in(Uuid::new_v4(), Uuid::new_v4(), "hello");
        assert_eq!(sync.sync_message(&message).await, SyncOutcome::UpsertFailed);
    }

    #[tokio::test]
    async fn test_spawn_sync_runs_detached() {
        let embedder = Arc::new(MockEmbedder::default());
        let index = Arc::new(MockIndex::default());
        let sync = coordinator(embedder, Arc::clone(&index));

        let message = message_in(Uuid::new_v4(), Uuid::new_v4(), "detached");
        let outcome = sync.spawn_sync(message).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Synced);
        assert_eq!(index.records().len(), 1);
    }
}
