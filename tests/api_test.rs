//! API surface tests: envelope shapes and status mapping over mock services

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use chatrag::api::routes::api_routes;
use chatrag::api::AppState;
use chatrag::config::AppConfig;
use chatrag::embeddings::Embedder;
use chatrag::errors::ChatRagError;
use chatrag::errors::Result;
use chatrag::index::QueryFilter;
use chatrag::index::VectorIndex;
use chatrag::llm::LanguageModel;
use chatrag::models::Message;
use chatrag::models::MessageMeta;
use chatrag::models::SimilarMatch;
use chatrag::models::VectorMetadata;
use chatrag::models::VectorRecord;
use chatrag::rag::AskPipeline;
use chatrag::store::MessageStore;
use chatrag::sync::SyncCoordinator;
use chrono::Utc;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

struct TestStore {
    history: Vec<Message>,
    known_channel: Uuid,
}

#[async_trait]
impl MessageStore for TestStore {
    async fn create_message(
        &self,
        channel_id: Uuid,
        account_id: Uuid,
        content: &str,
        meta: MessageMeta,
    ) -> Result<Message> {
        Ok(Message {
            message_id: Uuid::new_v4(),
            channel_id,
            network_id: Uuid::new_v4(),
            created_by: account_id,
            content: content.to_string(),
            created_at: Utc::now(),
            updated_at: None,
            meta,
        })
    }

    async fn list_recent(&self, _channel_id: Uuid, limit: usize) -> Result<Vec<Message>> {
        Ok(self.history.iter().rev().take(limit).cloned().collect())
    }

    async fn channel_in_network(&self, channel_id: Uuid, _network_id: Uuid) -> Result<bool> {
        Ok(channel_id == self.known_channel)
    }
}

struct TestEmbedder;

#[async_trait]
impl Embedder for TestEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1, 0.2, 0.3])
    }
}

#[derive(Default)]
struct TestIndex {
    matches: Vec<SimilarMatch>,
    upserts: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl VectorIndex for TestIndex {
    async fn upsert(&self, record: VectorRecord) -> Result<()> {
        self.upserts.lock().unwrap().push(record.message_id);
        Ok(())
    }

    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _filter: &QueryFilter,
    ) -> Result<Vec<SimilarMatch>> {
        Ok(self.matches.clone())
    }
}

struct TestModel {
    fail: bool,
}

#[async_trait]
impl LanguageModel for TestModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        if self.fail {
            return Err(ChatRagError::Generation("model down".to_string()));
        }
        Ok("a generated answer".to_string())
    }
}

fn excerpt(network_id: Uuid, channel_id: Uuid, content: &str) -> VectorMetadata {
    VectorMetadata {
        message_id: Uuid::new_v4(),
        channel_id,
        network_id,
        created_by: Uuid::new_v4(),
        created_at: Utc::now(),
        updated_at: None,
        content: content.to_string(),
        is_bot: false,
        in_response_to: None,
    }
}

fn app(known_channel: Uuid, matches: Vec<SimilarMatch>, model_fails: bool) -> axum::Router {
    let store: Arc<dyn MessageStore> = Arc::new(TestStore {
        history: Vec::new(),
        known_channel,
    });
    let embedder: Arc<dyn Embedder> = Arc::new(TestEmbedder);
    let index: Arc<dyn VectorIndex> = Arc::new(TestIndex {
        matches,
        upserts: Mutex::new(Vec::new()),
    });
    let model: Arc<dyn LanguageModel> = Arc::new(TestModel { fail: model_fails });

    let sync = Arc::new(SyncCoordinator::new(
        Arc::clone(&embedder),
        Arc::clone(&index),
    ));
    let pipeline = Arc::new(AskPipeline::from_services(
        store,
        embedder,
        index,
        model,
        Arc::clone(&sync),
        &AppConfig::default(),
    ));

    api_routes(AppState { pipeline, sync })
}

async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_ask_returns_success_envelope() {
    let channel = Uuid::new_v4();
    let (status, body) = post_json(
        app(channel, Vec::new(), false),
        "/messages/ask",
        json!({
            "network_id": Uuid::new_v4(),
            "channel_id": channel,
            "content": "what is the deploy process?",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "a generated answer");
}

#[tokio::test]
async fn test_similar_returns_results_and_response() {
    let channel = Uuid::new_v4();
    let network = Uuid::new_v4();
    let matches = vec![SimilarMatch {
        id: Uuid::new_v4(),
        score: 0.91,
        metadata: excerpt(network, channel, "we deploy from CI"),
    }];

    let (status, body) = post_json(
        app(channel, matches, false),
        "/messages/similar",
        json!({
            "network_id": network,
            "channel_id": channel,
            "content": "how do we deploy?",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["results"][0]["message"]["content"], "we deploy from CI");
    assert!(body["results"][0]["score"].as_f64().unwrap() > 0.9);
    assert_eq!(body["response"], "a generated answer");
}

#[tokio::test]
async fn test_empty_content_is_400_with_error_envelope() {
    let channel = Uuid::new_v4();
    let (status, body) = post_json(
        app(channel, Vec::new(), false),
        "/messages/ask",
        json!({
            "network_id": Uuid::new_v4(),
            "channel_id": channel,
            "content": "",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_unknown_channel_is_404() {
    let (status, body) = post_json(
        app(Uuid::new_v4(), Vec::new(), false),
        "/messages/ask",
        json!({
            "network_id": Uuid::new_v4(),
            "channel_id": Uuid::new_v4(),
            "content": "hello?",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_downstream_failure_is_500() {
    let channel = Uuid::new_v4();
    let (status, body) = post_json(
        app(channel, Vec::new(), true),
        "/messages/ask",
        json!({
            "network_id": Uuid::new_v4(),
            "channel_id": channel,
            "content": "hello?",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_sync_accepts_message_and_returns_immediately() {
    let channel = Uuid::new_v4();
    let message = Message {
        message_id: Uuid::new_v4(),
        channel_id: channel,
        network_id: Uuid::new_v4(),
        created_by: Uuid::new_v4(),
        content: "a new message".to_string(),
        created_at: Utc::now(),
        updated_at: None,
        meta: MessageMeta::default(),
    };

    let (status, body) = post_json(
        app(channel, Vec::new(), false),
        "/messages/sync",
        serde_json::to_value(&message).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_health_reports_version() {
    let app = app(Uuid::new_v4(), Vec::new(), false);
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
