//! Vector similarity index access

pub mod client;

pub use client::VectorIndexClient;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::SimilarMatch;
use crate::models::VectorRecord;

/// Metadata filter applied to similarity queries.
///
/// `network_id` is mandatory: matches must never leak across tenants.
/// `channel_id` optionally narrows recall to one channel.
#[derive(Debug, Clone)]
pub struct QueryFilter {
    pub network_id: Uuid,
    pub channel_id: Option<Uuid>,
}

/// Upserts and queries vectors with metadata filters.
///
/// `upsert` has overwrite semantics on an existing id. The index does not
/// interpret `is_bot` or any other business rule; filtering policy lives in
/// the context assembler.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, record: VectorRecord) -> Result<()>;

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &QueryFilter,
    ) -> Result<Vec<SimilarMatch>>;
}
