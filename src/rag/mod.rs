//! Retrieval-augmented reply pipeline
//!
//! End-to-end flow for answering `/ask`-style queries in a channel:
//! - Bounded recent history plus top-k similarity matches, merged under
//!   one context budget
//! - Persona prompt rendering
//! - LLM generation under a hard deadline
//! - Publishing the reply back into the message store and re-syncing it
//!   into the vector index
//!
//! # Examples
//!
//! ```rust,no_run
//! use chatrag::config::AppConfig;
//! use chatrag::models::Message;
//! use chatrag::rag::AskPipeline;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let pipeline = AskPipeline::from_config(&config)?;
//!
//!     let trigger = Message::trigger(
//!         Uuid::new_v4(),
//!         Uuid::new_v4(),
//!         None,
//!         "what is the deploy process?",
//!     );
//!     let outcome = pipeline.ask(&trigger).await?;
//!     println!("Reply: {}", outcome.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod generator;
pub mod pipeline;
pub mod prompts;
pub mod publisher;

pub use context::ContextAssembler;
pub use context::ContextBundle;
pub use generator::ResponseGenerator;
pub use pipeline::AskOutcome;
pub use pipeline::AskPipeline;
pub use pipeline::SimilarOutcome;
pub use prompts::PersonaPromptBuilder;
pub use publisher::ResponsePublisher;
