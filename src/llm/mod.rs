//! Language model access and prompt templating

pub mod client;
pub mod prompts;

pub use client::LlmClient;
pub use prompts::PromptTemplate;

use async_trait::async_trait;

use crate::errors::Result;

/// Produces a completion for a rendered prompt.
///
/// The hard deadline is applied by the response generator, not here.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
