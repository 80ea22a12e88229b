mod config;
mod error;

use ledger::{LedgerContext, RpcLedger, ToolRegistry};
use mcp::{Server, ServerInfo};
use tracing_subscriber::EnvFilter;

use config::ServerConfig;
use error::Result;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// stdout carries the protocol, so logs must stay on stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

async fn run() -> Result<()> {
    let config = ServerConfig::from_env()?;
    tracing::info!(
        network = %config.network,
        chain = config.network.name(),
        rpc_url = %config.rpc_url,
        signer = config.signer.is_some(),
        "loaded configuration"
    );

    let mut context =
        LedgerContext::new(RpcLedger::new(&config.rpc_url)).with_wallets(config.wallets);
    if let Some(signer) = config.signer {
        context = context.with_signer(signer);
    }

    let registry = ToolRegistry::new(context)?;
    let server = Server::new(
        ServerInfo::new("web3-tools", env!("CARGO_PKG_VERSION")),
        registry,
    );

    tracing::info!("Web3 MCP Server running on stdio");
    server.serve_stdio().await?;
    Ok(())
}
