//! Pinecone-dialect REST client for the similarity index

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::index::QueryFilter;
use crate::index::VectorIndex;
use crate::models::SimilarMatch;
use crate::models::VectorMetadata;
use crate::models::VectorRecord;

/// REST client for a Pinecone-compatible vector index
pub struct VectorIndexClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl VectorIndexClient {
    /// Create a new index client
    pub fn new(endpoint: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(50)
            .build()
            .map_err(|e| ChatRagError::Http(e.to_string()))?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }

    /// Build a client from the `[index]` config section
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.index.endpoint.clone(), config.index.api_key.clone())
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.endpoint);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ChatRagError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatRagError::Index(format!(
                "Index API error ({status}): {error_text}"
            )));
        }

        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct UpsertVector<'a> {
    id: String,
    values: &'a [f32],
    metadata: &'a VectorMetadata,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Option<serde_json::Value>,
}

#[async_trait]
impl VectorIndex for VectorIndexClient {
    async fn upsert(&self, record: VectorRecord) -> Result<()> {
        debug!("Upserting vector record for message {}", record.message_id);

        let body = json!({
            "vectors": [UpsertVector {
                id: record.message_id.to_string(),
                values: &record.vector,
                metadata: &record.metadata,
            }],
        });

        self.post_json("/vectors/upsert", &body).await?;
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &QueryFilter,
    ) -> Result<Vec<SimilarMatch>> {
        let mut filter_map = serde_json::Map::new();
        filter_map.insert(
            "network_id".to_string(),
            json!({"$eq": filter.network_id.to_string()}),
        );
        if let Some(channel_id) = filter.channel_id {
            filter_map.insert(
                "channel_id".to_string(),
                json!({"$eq": channel_id.to_string()}),
            );
        }

        let body = json!({
            "vector": vector,
            "topK": top_k,
            "filter": filter_map,
            "includeMetadata": true,
        });

        let response = self.post_json("/query", &body).await?;
        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| ChatRagError::Index(format!("Failed to parse query response: {e}")))?;

        let mut matches = Vec::with_capacity(result.matches.len());
        for raw in result.matches {
            let Ok(id) = raw.id.parse() else {
                warn!("Skipping match with non-uuid id: {}", raw.id);
                continue;
            };

            let Some(metadata_value) = raw.metadata else {
                warn!("Skipping match {} without metadata", raw.id);
                continue;
            };

            match serde_json::from_value::<VectorMetadata>(metadata_value) {
                Ok(metadata) => matches.push(SimilarMatch {
                    id,
                    score: raw.score,
                    metadata,
                }),
                Err(e) => warn!("Skipping match {} with malformed metadata: {e}", raw.id),
            }
        }

        debug!("Index query returned {} usable matches", matches.len());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_metadata_survives_json_round_trip() {
        let metadata = VectorMetadata {
            message_id: Uuid::new_v4(),
            channel_id: Uuid::new_v4(),
            network_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: None,
            content: "what is the deploy process?".to_string(),
            is_bot: false,
            in_response_to: None,
        };

        let value = serde_json::to_value(&metadata).unwrap();
        let back: VectorMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back.message_id, metadata.message_id);
        assert_eq!(back.content, metadata.content);
    }

    #[test]
    fn test_query_response_tolerates_missing_fields() {
        let raw = r#"{"matches": [{"id": "not-a-uuid"}, {"id": "550e8400-e29b-41d4-a716-446655440000"}]}"#;
        let parsed: QueryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.matches.len(), 2);
        assert!(parsed.matches[0].metadata.is_none());
    }
}
