//! Reply generation under a hard deadline

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::llm::LanguageModel;

/// Invokes the language model with a hard timeout.
///
/// This is the only synchronous, user-facing provider call in the pipeline
/// and therefore the only one under an explicit deadline. Dropping the
/// returned future (e.g. on client disconnect) cancels the in-flight call.
pub struct ResponseGenerator {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl ResponseGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Generate a completion, failing with a typed error on timeout or
    /// provider failure. No side effects on failure.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Generating reply ({} char prompt)", prompt.chars().count());

        match tokio::time::timeout(self.timeout, self.model.complete(prompt)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ChatRagError::Generation(e.to_string())),
            Err(_) => Err(ChatRagError::Generation(format!(
                "generation timed out after {:?}",
                self.timeout
            ))),
        }
    }
}
