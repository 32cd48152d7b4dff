mod cli;
mod config;
mod db;
mod notes;
mod server;
mod sync;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notebridge", version, about = "MCP bridge for a file-synced Markdown note app")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Start the MCP server (Streamable HTTP transport)
    ServeHttp,
    /// Run the first-time setup: discover notebooks and grant agent access
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::BridgeConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve_stdio(config).await?;
        }
        Command::ServeHttp => {
            server::serve_http(config).await?;
        }
        Command::Setup => {
            cli::run_setup(&config)?;
        }
    }

    Ok(())
}
