//! Shepherd CLI — the main entry point.
//!
//! Commands:
//! - `init`     — Initialize config and database
//! - `serve`    — Start the HTTP gateway
//! - `ask`      — Ask the mentor a single question
//! - `template` — Show, set, or list revisions of the instruction template
//! - `kb`       — Manage knowledge entries and curated lessons

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "shepherd",
    about = "Shepherd — mentor-chat backend for a discipleship platform",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and the local database
    Init,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask the mentor a single question
    Ask {
        /// The question text
        question: String,
    },

    /// Manage the instruction template
    Template {
        #[command(subcommand)]
        action: commands::template::TemplateAction,
    },

    /// Manage the knowledge base
    Kb {
        #[command(subcommand)]
        action: commands::kb::KbAction,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask { question } => commands::ask::run(&question).await?,
        Commands::Template { action } => commands::template::run(action).await?,
        Commands::Kb { action } => commands::kb::run(action).await?,
    }

    Ok(())
}
