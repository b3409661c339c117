use chatrag::api::serve_api;
use chatrag::config::AppConfig;
use chatrag::logging::init_logging_with_config;
use chatrag::models::Message;
use chatrag::rag::AskPipeline;
use clap::Parser;
use clap::Subcommand;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "chatrag")]
#[command(about = "Vector-index sync and retrieval-augmented persona replies for a chat store")]
#[command(version)]
struct Cli {
    /// Path to a config file (defaults to config.toml / config.example.toml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Enable permissive CORS
        #[arg(long)]
        cors: bool,
    },
    /// Run one ask query from the command line
    Ask {
        /// Network the channel belongs to
        #[arg(long)]
        network_id: Uuid,
        /// Channel to answer into
        #[arg(long)]
        channel_id: Uuid,
        /// The question to answer
        question: String,
        /// Skip publishing; print the reply and the matches instead
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the configuration and print a summary
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };
    init_logging_with_config(Some(&config))?;

    match cli.command {
        Commands::Serve { host, port, cors } => {
            serve_api(&config, host, port, cors).await?;
        }
        Commands::Ask {
            network_id,
            channel_id,
            question,
            dry_run,
        } => {
            let pipeline = AskPipeline::from_config(&config)?;
            let trigger = Message::trigger(network_id, channel_id, None, question);

            if dry_run {
                let outcome = pipeline.similar(&trigger).await?;
                for m in &outcome.matches {
                    println!("{:.2} - {}", m.score, m.metadata.content);
                }
                println!("\n{}", outcome.answer);
            } else {
                let outcome = pipeline.ask(&trigger).await?;
                info!("Reply published as {}", outcome.reply.message_id);
                println!("{}", outcome.answer);
            }
        }
        Commands::CheckConfig => {
            println!("store:      {}", config.store_base_url());
            println!(
                "embeddings: {} ({} dims)",
                config.embedding_model(),
                config.embedding_dimension()
            );
            println!("index:      {}", config.index_endpoint());
            println!(
                "retrieval:  H={} K={} threshold={}",
                config.history_limit(),
                config.top_k(),
                config.score_threshold()
            );
            println!("llm:        {} @ {}", config.llm_model(), config.llm_endpoint());
            println!("persona:    {}", config.persona.name);
        }
    }

    Ok(())
}
