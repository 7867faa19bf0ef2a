//! calclaw CLI: the main entry point.
//!
//! Commands:
//! - `init`   : Write a default config file
//! - `auth`   : Authorize access to Google Calendar
//! - `chat`   : Interactive chat with the calendar assistant
//! - `ask`    : Send a single message
//! - `serve`  : Start the HTTP chat gateway
//! - `tools`  : Print the tool catalog
//! - `doctor` : Diagnose configuration and credentials

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "calclaw",
    about = "calclaw: a Google Calendar assistant driven by an LLM",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// Authorize calclaw to access your Google Calendar
    Auth {
        /// Seconds to wait for the browser redirect
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Chat with the calendar assistant
    Chat {
        /// Resume an existing session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Send a single message and print the reply
    Ask {
        #[arg(short, long)]
        message: String,

        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the tool definitions sent to the LLM
    Tools,

    /// Diagnose configuration and credentials
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Auth { timeout } => commands::auth::run(timeout).await?,
        Commands::Chat { session } => commands::chat::run(session).await?,
        Commands::Ask { message, session } => commands::ask::run(message, session).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
