use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatRagError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Channel not found or not accessible: {0}")]
    Scope(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChatRagError>;
