mod config;
mod error;
mod launch;
mod shell;

use std::io;
use std::path::PathBuf;

use clap::Parser;
use runtime::{Conversation, McpToolHost};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;
use launch::launch_command;

#[derive(Parser)]
#[command(name = "ledger-chat")]
#[command(
    about = "Chat with a model that can query an Ethereum ledger through MCP tools",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Tool server entry point: a .js, .ts or .py script, or an executable
    server_path: PathBuf,

    /// Configuration file (defaults to ./ledger-chat.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout belongs to the REPL.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::discover(cli.config.as_deref())?.with_env(|name| std::env::var(name).ok());
    let backend = config.backend()?;
    let launch = launch_command(&cli.server_path)?;

    let host = McpToolHost::spawn(&launch.program, &launch.args)
        .await
        .inspect_err(|e| eprintln!("Failed to connect to MCP server: {e}"))?;
    println!("Connected to server with tools: {:?}", host.tool_names());

    let conversation = Conversation::new(backend, host)
        .with_max_tool_depth(config.conversation.max_tool_depth);

    let result = shell::run(&conversation, io::stdin().lock(), io::stdout()).await;

    // Release the server on every path out of the loop.
    let shutdown = conversation.into_tools().shutdown().await;
    result?;
    shutdown?;
    Ok(())
}
