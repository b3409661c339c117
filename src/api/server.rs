//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingClient;
use crate::errors::ChatRagError;
use crate::index::VectorIndex;
use crate::index::VectorIndexClient;
use crate::llm::LanguageModel;
use crate::llm::LlmClient;
use crate::rag::AskPipeline;
use crate::store::MessageStore;
use crate::store::RestMessageStore;
use crate::sync::SyncCoordinator;
use crate::Result;

/// Build the application state from configuration
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let store: Arc<dyn MessageStore> = Arc::new(RestMessageStore::from_config(config)?);
    let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingClient::from_config(config)?);
    let index: Arc<dyn VectorIndex> = Arc::new(VectorIndexClient::from_config(config)?);
    let model: Arc<dyn LanguageModel> = Arc::new(LlmClient::from_config(config)?);

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
        config,
    ));

    Ok(AppState { pipeline, sync })
}

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("Starting chatrag API server...");

    let state = build_state(config)?;

    let mut app = Router::new()
        .nest("/api", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let addr = format!("{host}:{port}");
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ChatRagError::Http(format!("Failed to bind {addr}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ChatRagError::Http(e.to_string()))?;

    Ok(())
}
