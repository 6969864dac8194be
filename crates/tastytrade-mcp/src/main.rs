//! Tastytrade MCP Server - Entry Point
//!
//! Provides both stdio (for local MCP hosts) and HTTP transports.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tastytrade_mcp::{TastytradeClient, config::Config, server::McpServer};

#[derive(Parser, Debug)]
#[command(name = "tastytrade-mcp")]
#[command(about = "MCP server for the Tastytrade brokerage API")]
#[command(version)]
struct Cli {
    /// Transport mode: stdio or http
    #[arg(long, default_value = "stdio", env = "MCP_TRANSPORT")]
    transport: Transport,

    /// HTTP server port (only used with --transport http)
    #[arg(long, default_value = "8000", env = "PORT")]
    port: u16,

    /// Base URL for OAuth metadata documents (e.g., https://mcp.example.com)
    #[arg(long, env = "BASE_URL")]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum Transport {
    /// Standard input/output (for local MCP hosts)
    #[default]
    Stdio,
    /// Streamable HTTP with OAuth-gated endpoints
    Http,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = ?cli.transport,
        "Starting Tastytrade MCP server"
    );

    let config = Config::from_env()?;
    let bearer_token = config.bearer_token.clone();
    let client = TastytradeClient::new(config)?;

    // Brokerage connection failure is non-fatal: the server starts and
    // the check_auth_status tool can retry later.
    match client.authenticate().await {
        Ok(accounts) => tracing::info!(accounts, "Connected to Tastytrade"),
        Err(e) => tracing::warn!(error = %e,
            "Starting without a Tastytrade connection; use check_auth_status to retry"),
    }

    let server = McpServer::new(client, bearer_token);

    match cli.transport {
        Transport::Stdio => {
            tracing::info!("Running in stdio mode");
            server.run_stdio().await?;
        }
        Transport::Http => {
            tracing::info!(port = cli.port, base_url = ?cli.base_url, "Running in HTTP mode");
            server.run_http(cli.port, cli.base_url).await?;
        }
    }

    Ok(())
}
