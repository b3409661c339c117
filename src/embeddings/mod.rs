//! Embedding generation for message content

pub mod client;

pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;

use async_trait::async_trait;

use crate::errors::Result;

/// Turns text into a fixed-length vector.
///
/// Implementations are stateless wrappers around a provider API; retry
/// policy belongs to the caller, not here.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
