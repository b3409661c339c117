//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::llm::LanguageModel;

/// Client for an OpenAI-compatible chat completions endpoint
pub struct LlmClient {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: Client,
}

impl LlmClient {
    /// Build a client from the `[llm]` config section
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(20)
            .build()
            .map_err(|e| ChatRagError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: config.llm.llm_endpoint.clone(),
            api_key: config.llm.llm_key.clone(),
            model: config.llm.llm_model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            client,
        })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {} ({})", url, self.model);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatRagError::Generation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatRagError::Generation(format!(
                "LLM API error ({status}): {error_text}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatRagError::Generation(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ChatRagError::Generation("No completion in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "hi there"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("hi there")
        );
    }
}
