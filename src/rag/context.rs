//! Context assembly: recent history merged with similarity matches

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use tracing::warn;
use uuid::Uuid;

use crate::config::RetrievalConfig;
use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::index::QueryFilter;
use crate::index::VectorIndex;
use crate::models::Message;
use crate::models::SimilarMatch;
use crate::store::MessageStore;

/// The merged, bounded context for one query. Never persisted.
///
/// `history` is chronological (oldest first); `matches` are ranked by score
/// descending, recency descending on ties. A message appearing in both
/// lists is kept only under its similarity rank.
#[derive(Debug, Clone, Default)]
pub struct ContextBundle {
    pub history: Vec<Message>,
    pub matches: Vec<SimilarMatch>,
}

/// Builds a [`ContextBundle`] for a triggering message
pub struct ContextAssembler {
    store: Arc<dyn MessageStore>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    retrieval: RetrievalConfig,
}

impl ContextAssembler {
    pub fn new(
        store: Arc<dyn MessageStore>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            index,
            retrieval,
        }
    }

    /// Assemble history and similarity context for `trigger`.
    ///
    /// The history fetch and the query embedding are independent reads and
    /// run concurrently. A failed history fetch is fatal - there would be no
    /// context at all. A failed embedding or index query only degrades the
    /// bundle to history-only.
    pub async fn assemble(&self, trigger: &Message) -> Result<ContextBundle> {
        let (history_result, embed_result) = tokio::join!(
            self.store
                .list_recent(trigger.channel_id, self.retrieval.history_limit),
            self.embedder.embed(&trigger.content),
        );

        // Store returns created_at descending; the prompt wants chronological
        let mut history = history_result?;
        history.reverse();

        let matches = match embed_result {
            Ok(vector) => self.query_similar(trigger, &vector).await,
            Err(e) => {
                warn!("Query embedding failed, continuing with history only: {e}");
                Vec::new()
            }
        };

        let matches = rank_matches(
            matches,
            trigger.message_id,
            self.retrieval.score_threshold,
            self.retrieval.exclude_bot_matches,
        );

        let (history, matches) =
            dedupe_and_bound(history, matches, self.retrieval.max_context_chars);

        debug!(
            "Assembled context: {} history messages, {} similarity matches",
            history.len(),
            matches.len()
        );

        Ok(ContextBundle { history, matches })
    }

    async fn query_similar(&self, trigger: &Message, vector: &[f32]) -> Vec<SimilarMatch> {
        let filter = QueryFilter {
            network_id: trigger.network_id,
            channel_id: self
                .retrieval
                .scope_to_channel
                .then_some(trigger.channel_id),
        };

        match self
            .index
            .query(vector, self.retrieval.top_k, &filter)
            .await
        {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Similarity search failed, continuing with history only: {e}");
                Vec::new()
            }
        }
    }
}

/// Filter and order similarity matches.
///
/// Drops the trigger itself, matches below the score threshold, and
/// (optionally) bot-authored matches. Orders by score descending, breaking
/// ties with recency descending.
pub(crate) fn rank_matches(
    mut matches: Vec<SimilarMatch>,
    trigger_id: Uuid,
    score_threshold: f32,
    exclude_bot: bool,
) -> Vec<SimilarMatch> {
    matches.retain(|m| {
        m.id != trigger_id && m.score >= score_threshold && !(exclude_bot && m.metadata.is_bot)
    });

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.metadata.created_at.cmp(&a.metadata.created_at))
    });

    matches
}

/// Collapse duplicates and enforce the context length bound.
///
/// A message present in both lists survives only as its similarity-ranked
/// copy. When over budget (summed content characters), similarity matches
/// are dropped before history, lowest score first; history is then dropped
/// oldest first.
pub(crate) fn dedupe_and_bound(
    mut history: Vec<Message>,
    mut matches: Vec<SimilarMatch>,
    max_chars: usize,
) -> (Vec<Message>, Vec<SimilarMatch>) {
    let matched_ids: HashSet<Uuid> = matches.iter().map(|m| m.id).collect();
    history.retain(|m| !matched_ids.contains(&m.message_id));

    let mut total: usize = history
        .iter()
        .map(|m| m.content.chars().count())
        .chain(matches.iter().map(|m| m.metadata.content.chars().count()))
        .sum();

    while total > max_chars {
        if let Some(dropped) = matches.pop() {
            total -= dropped.metadata.content.chars().count();
        } else if !history.is_empty() {
            let dropped = history.remove(0);
            total -= dropped.content.chars().count();
        } else {
            break;
        }
    }

    (history, matches)
}
