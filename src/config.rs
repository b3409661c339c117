use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the message store REST API
    pub base_url: String,
    pub api_key: String,
    /// Account the bot publishes replies as
    pub bot_account_id: Uuid,
    #[serde(default = "default_store_timeout")]
    pub request_timeout_secs: u64,
}

fn default_store_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// "openai" or "ollama"
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Must match the dimensionality the index was created with
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Base URL of the vector index (Pinecone-dialect REST)
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Recent messages pulled from the trigger's channel
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Similarity matches requested from the index
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Matches scoring below this are dropped
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// Upper bound on assembled context, in content characters
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    /// Drop bot-authored similarity matches so the bot does not quote its
    /// own prior answers
    #[serde(default = "default_exclude_bot_matches")]
    pub exclude_bot_matches: bool,
    /// Narrow similarity search to the trigger's channel instead of the
    /// whole network
    #[serde(default)]
    pub scope_to_channel: bool,
}

fn default_history_limit() -> usize {
    15
}

fn default_top_k() -> usize {
    5
}

fn default_score_threshold() -> f32 {
    0.5
}

fn default_max_context_chars() -> usize {
    4000
}

fn default_exclude_bot_matches() -> bool {
    true
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            max_context_chars: default_max_context_chars(),
            exclude_bot_matches: default_exclude_bot_matches(),
            scope_to_channel: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub llm_endpoint: String,
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> usize {
    500
}

/// Persona the bot answers as; swapping personas is a config change only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub name: String,
    /// Voice/tone description interpolated into the prompt
    pub voice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub persona: PersonaConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            println!(
                "Warning: Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::ChatRagError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Get message store base URL
    pub fn store_base_url(&self) -> &str {
        &self.store.base_url
    }

    /// Get the bot account id replies are published as
    pub fn bot_account_id(&self) -> Uuid {
        self.store.bot_account_id
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get vector index endpoint
    pub fn index_endpoint(&self) -> &str {
        &self.index.endpoint
    }

    /// Get recent-history window size
    pub fn history_limit(&self) -> usize {
        self.retrieval.history_limit
    }

    /// Get similarity top-k
    pub fn top_k(&self) -> usize {
        self.retrieval.top_k
    }

    /// Get similarity score threshold
    pub fn score_threshold(&self) -> f32 {
        self.retrieval.score_threshold
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Get the generation deadline
    pub fn generation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.llm.timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                base_url: "http://localhost:54321".to_string(),
                api_key: "service-role-key".to_string(),
                bot_account_id: Uuid::nil(),
                request_timeout_secs: default_store_timeout(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
            embeddings: EmbeddingsConfig {
                provider: "openai".to_string(),
                model: "text-embedding-3-large".to_string(),
                endpoint: "https://api.openai.com/v1".to_string(),
                api_key: None,
                dimension: 3072,
            },
            index: IndexConfig {
                endpoint: "http://localhost:5080".to_string(),
                api_key: "pinecone-key".to_string(),
            },
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig {
                llm_endpoint: "https://api.openai.com/v1".to_string(),
                llm_key: String::new(),
                llm_model: default_llm_model(),
                timeout_secs: default_llm_timeout(),
                temperature: default_temperature(),
                max_tokens: default_max_tokens(),
            },
            persona: PersonaConfig {
                name: "Echo".to_string(),
                voice: "playful and concise, fond of light teasing".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_defaults() {
        let retrieval = RetrievalConfig::default();
        assert_eq!(retrieval.history_limit, 15);
        assert_eq!(retrieval.top_k, 5);
        assert!(retrieval.exclude_bot_matches);
        assert!(!retrieval.scope_to_channel);
    }

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let raw = r#"
            [store]
            base_url = "http://store.local"
            api_key = "k"
            bot_account_id = "550e8400-e29b-41d4-a716-446655440000"

            [logging]
            level = "debug"
            backtrace = false

            [embeddings]
            provider = "ollama"
            model = "nomic-embed-text"
            endpoint = "http://localhost:11434"
            dimension = 768

            [index]
            endpoint = "http://localhost:5080"
            api_key = "k"

            [llm]
            llm_endpoint = "http://localhost:11434/v1"
            llm_key = "ollama"

            [persona]
            name = "Echo"
            voice = "dry"
        "#;

        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.retrieval.history_limit, 15);
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.embedding_dimension(), 768);
        assert_eq!(config.persona.name, "Echo");
    }
}
