//! Complete reply pipeline: assemble -> prompt -> generate -> publish

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::config::PersonaConfig;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingClient;
use crate::errors::ChatRagError;
use crate::errors::Result;
use crate::index::VectorIndex;
use crate::index::VectorIndexClient;
use crate::llm::LanguageModel;
use crate::llm::LlmClient;
use crate::models::validate_content;
use crate::models::Message;
use crate::models::SimilarMatch;
use crate::rag::ContextAssembler;
use crate::rag::PersonaPromptBuilder;
use crate::rag::ResponseGenerator;
use crate::rag::ResponsePublisher;
use crate::store::MessageStore;
use crate::store::RestMessageStore;
use crate::sync::SyncCoordinator;

/// One query through the full pipeline.
///
/// Each call is a single attempt: there is no retry loop in here. A query
/// either ends published-and-synced or fails with a typed error; retries,
/// if desired, are the caller's policy.
pub struct AskPipeline {
    store: Arc<dyn MessageStore>,
    assembler: ContextAssembler,
    prompt_builder: PersonaPromptBuilder,
    generator: ResponseGenerator,
    publisher: ResponsePublisher,
    persona: PersonaConfig,
}

/// Outcome of a published query
#[derive(Debug, Clone)]
pub struct AskOutcome {
    pub answer: String,
    pub reply: Message,
    pub matches: Vec<SimilarMatch>,
}

/// Outcome of a similarity-browsing query (nothing published)
#[derive(Debug, Clone)]
pub struct SimilarOutcome {
    pub answer: String,
    pub matches: Vec<SimilarMatch>,
}

impl AskPipeline {
    /// Create a pipeline backed by the production service clients
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn MessageStore> = Arc::new(RestMessageStore::from_config(config)?);
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingClient::from_config(config)?);
        let index: Arc<dyn VectorIndex> = Arc::new(VectorIndexClient::from_config(config)?);
        let model: Arc<dyn LanguageModel> = Arc::new(LlmClient::from_config(config)?);
        let sync = Arc::new(SyncCoordinator::new(
            Arc::clone(&embedder),
            Arc::clone(&index),
        ));

        Ok(Self::from_services(
            store, embedder, index, model, sync, config,
        ))
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(
        store: Arc<dyn MessageStore>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn LanguageModel>,
        sync: Arc<SyncCoordinator>,
        config: &AppConfig,
    ) -> Self {
        let assembler = ContextAssembler::new(
            Arc::clone(&store),
            embedder,
            index,
            config.retrieval.clone(),
        );
        let generator = ResponseGenerator::new(model, config.generation_timeout());
        let publisher =
            ResponsePublisher::new(Arc::clone(&store), sync, config.store.bot_account_id);

        Self {
            store,
            assembler,
            prompt_builder: PersonaPromptBuilder::new(),
            generator,
            publisher,
            persona: config.persona.clone(),
        }
    }

    /// Answer a query and publish the reply into the trigger's channel.
    ///
    /// Flow: validate -> assemble context (history fetch and query embedding
    /// concurrently, then similarity query) -> render persona prompt ->
    /// generate under the deadline -> publish and sync the reply. Similarity
    /// failures degrade to history-only context; history-fetch, generation
    /// and publish failures abort.
    pub async fn ask(&self, trigger: &Message) -> Result<AskOutcome> {
        info!("Processing ask query in channel {}", trigger.channel_id);

        let (answer, matches) = self.respond(trigger).await?;
        let reply = self.publisher.publish(trigger, &answer).await?;

        info!("Ask query answered and published as {}", reply.message_id);
        Ok(AskOutcome {
            answer,
            reply,
            matches,
        })
    }

    /// Answer a query without publishing anything
    pub async fn similar(&self, trigger: &Message) -> Result<SimilarOutcome> {
        info!(
            "Processing similarity query in channel {}",
            trigger.channel_id
        );

        let (answer, matches) = self.respond(trigger).await?;
        Ok(SimilarOutcome { answer, matches })
    }

    async fn respond(&self, trigger: &Message) -> Result<(String, Vec<SimilarMatch>)> {
        validate_content(&trigger.content)?;
        if trigger.meta.is_bot {
            // Bot messages are synced for search but never answered; this is
            // what keeps reply-publishing from looping
            return Err(ChatRagError::Validation(
                "bot messages do not trigger replies".to_string(),
            ));
        }

        if !self
            .store
            .channel_in_network(trigger.channel_id, trigger.network_id)
            .await?
        {
            return Err(ChatRagError::Scope(format!(
                "channel {} in network {}",
                trigger.channel_id, trigger.network_id
            )));
        }

        debug!("Step 1: Assembling context");
        let bundle = self.assembler.assemble(trigger).await?;

        debug!("Step 2: Rendering persona prompt");
        let prompt = self
            .prompt_builder
            .build(&bundle, &trigger.content, &self.persona);

        debug!("Step 3: Generating reply");
        let answer = self.generator.generate(&prompt).await?;

        Ok((answer, bundle.matches))
    }
}
