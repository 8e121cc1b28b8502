// Mentor study and productivity assistant
// Main entry point for the mentor binary

use clap::Parser;
use mentor_engine::cli::{Cli, Command, MemoryAction};
use mentor_engine::config::Config;
use mentor_engine::handlers::{
    failure_hint, handle_ask, handle_batch, handle_chat, handle_graph, handle_memory_add_note,
    handle_memory_reset, handle_memory_show, handle_ping, OutputFormat,
};
use mentor_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Some(hint) = failure_hint(&e) {
                eprintln!("{}", hint);
            }
            Err(e)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_or_create_at(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log beats the config file; RUST_LOG beats both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::info!(
        "Mentor v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );
    tracing::debug!(provider = %config.llm.provider, "Configuration loaded");

    match cli.command {
        Command::Chat => handle_chat(&config, format).await,

        Command::Ask { query } => handle_ask(&query, &config, format).await,

        Command::Batch { queries, output } => handle_batch(queries, output, &config, format).await,

        Command::Graph => handle_graph(&config, format).await,

        Command::Ping => handle_ping(&config, format).await,

        Command::Memory { action } => match action {
            MemoryAction::Show => handle_memory_show(&config, format).await,
            MemoryAction::AddNote { text } => handle_memory_add_note(&text, &config, format).await,
            MemoryAction::Reset => handle_memory_reset(&config, format).await,
        },
    }
}
