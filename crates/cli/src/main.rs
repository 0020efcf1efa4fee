//! rolechat CLI — the main entry point.
//!
//! Commands:
//! - `roles`    — List roles from the role directory
//! - `sessions` — List stored conversation sessions
//! - `chat`     — Stream a conversation with a named role

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "rolechat",
    about = "rolechat — persistent streaming chat with named roles",
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
    /// List roles from the role directory
    Roles,

    /// List stored conversation sessions
    Sessions,

    /// Chat with a role
    Chat {
        /// Role name to chat with
        role: String,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Reuse an explicit session id
        #[arg(long)]
        session: Option<String>,

        /// Force a fresh session even when one exists for the role
        #[arg(long)]
        new_session: bool,

        /// Topic id to scope the conversation to
        #[arg(long)]
        topic: Option<String>,

        /// Model override
        #[arg(long)]
        model: Option<String>,
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
        Commands::Roles => commands::roles::run().await?,
        Commands::Sessions => commands::sessions::run().await?,
        Commands::Chat { role, message, session, new_session, topic, model } => {
            commands::chat::run(commands::chat::ChatArgs {
                role,
                message,
                session,
                new_session,
                topic,
                model,
            })
            .await?
        }
    }

    Ok(())
}
