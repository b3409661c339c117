//! Message store access (PostgREST-dialect relational API)

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::models::Message;
use crate::models::MessageMeta;

/// The system-of-record message store.
///
/// This crate reads history and performs exactly one kind of write: the
/// atomic create used to publish a bot reply. Everything else about the
/// store (auth, CRUD, change feeds) belongs to the surrounding application.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Atomically create a message and return the stored row
    async fn create_message(
        &self,
        channel_id: Uuid,
        account_id: Uuid,
        content: &str,
        meta: MessageMeta,
    ) -> Result<Message>;

    /// Last `limit` messages in a channel, ordered by `created_at` descending
    async fn list_recent(&self, channel_id: Uuid, limit: usize) -> Result<Vec<Message>>;

    /// Whether the channel exists inside the given network
    async fn channel_in_network(&self, channel_id: Uuid, network_id: Uuid) -> Result<bool>;
}

/// REST client for a PostgREST-style message store
pub struct RestMessageStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl RestMessageStore {
    /// Create a new store client
    pub fn new(base_url: String, api_key: String, request_timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(request_timeout_secs))
            .pool_max_idle_per_host(50)
            .build()
            .map_err(|e| ChatRagError::Http(e.to_string()))?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    /// Build a client from the `[store]` config section
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.store.base_url.clone(),
            config.store.api_key.clone(),
            config.store.request_timeout_secs,
        )
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatRagError::Http(format!(
                "Store API error ({status}): {error_text}"
            )));
        }
        Ok(response)
    }
}

#[derive(Serialize)]
struct CreateMessageRpc<'a> {
    p_channel_id: Uuid,
    p_account_id: Uuid,
    p_content: &'a str,
    p_meta: &'a MessageMeta,
}

#[async_trait]
impl MessageStore for RestMessageStore {
    async fn create_message(
        &self,
        channel_id: Uuid,
        account_id: Uuid,
        content: &str,
        meta: MessageMeta,
    ) -> Result<Message> {
        let url = format!("{}/rest/v1/rpc/create_message", self.base_url);
        debug!("Creating message in channel {}", channel_id);

        let body = CreateMessageRpc {
            p_channel_id: channel_id,
            p_account_id: account_id,
            p_content: content,
            p_meta: &meta,
        };

        let response = self
            .auth(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatRagError::Http(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let message: Message = response
            .json()
            .await
            .map_err(|e| ChatRagError::Http(format!("Failed to parse created message: {e}")))?;

        Ok(message)
    }

    async fn list_recent(&self, channel_id: Uuid, limit: usize) -> Result<Vec<Message>> {
        let url = format!(
            "{}/rest/v1/messages?channel_id=eq.{channel_id}&order=created_at.desc&limit={limit}",
            self.base_url
        );

        let response = self
            .auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ChatRagError::Http(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let messages: Vec<Message> = response
            .json()
            .await
            .map_err(|e| ChatRagError::Http(format!("Failed to parse messages: {e}")))?;

        Ok(messages)
    }

    async fn channel_in_network(&self, channel_id: Uuid, network_id: Uuid) -> Result<bool> {
        let url = format!(
            "{}/rest/v1/channels?channel_id=eq.{channel_id}&network_id=eq.{network_id}&select=channel_id",
            self.base_url
        );

        let response = self
            .auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ChatRagError::Http(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ChatRagError::Http(format!("Failed to parse channels: {e}")))?;

        Ok(!rows.is_empty())
    }
}
