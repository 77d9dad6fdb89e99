//! ZetaChain MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server for ZetaChain.
//! Serves the tool catalog over stdio by default, or over HTTP with `http`.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use zetachain_mcp_server::config::Config;
use zetachain_mcp_server::error::Result;
use zetachain_mcp_server::logging::init_logging;
use zetachain_mcp_server::mcp::http::{self, AppState};
use zetachain_mcp_server::mcp::server::McpServer;
use zetachain_mcp_server::mcp::tools::ZetaChainTools;
use zetachain_mcp_server::mcp::transport::StreamTransport;

/// ZetaChain MCP Server
#[derive(Parser)]
#[command(name = "zetachain-mcp-server")]
#[command(author, version, about = "ZetaChain MCP Server - A Model Context Protocol server for ZetaChain")]
struct Cli {
    /// ZetaChain network (athens, mainnet, localhost)
    #[arg(long, global = true)]
    network: Option<String>,

    /// Custom RPC URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over HTTP instead of stdio
    Http {
        /// Host to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    // Defaults, then environment, then flags
    let mut config = Config::from_env()?;
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(rpc_url) = cli.rpc_url {
        config.set_rpc_url(rpc_url);
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_ms = timeout;
    }

    match cli.command {
        Some(Commands::Http { host, port }) => {
            if let Some(host) = host {
                config.http_host = host;
            }
            if let Some(port) = port {
                config.http_port = port;
            }
            run_http(config).await
        }
        None => run_stdio(config).await,
    }
}

fn build_server(config: Config) -> Arc<McpServer> {
    let tools = ZetaChainTools::http(Arc::new(config));
    Arc::new(McpServer::new(Arc::new(tools)))
}

async fn run_stdio(config: Config) -> Result<()> {
    info!(network = %config.network, rpc_url = %config.rpc_url, "Starting ZetaChain MCP server on stdio");
    let server = build_server(config);
    server.initialize().await?;

    let mut transport = StreamTransport::stdio();
    let outcome = tokio::select! {
        result = transport.serve(&server) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, shutting down");
            Ok(())
        }
    };

    server.close().await;
    if let Err(e) = &outcome {
        error!(error = %e, "Transport failed");
    }
    outcome
}

async fn run_http(config: Config) -> Result<()> {
    let bind_socket = config.bind_socket()?;
    info!(network = %config.network, rpc_url = %config.rpc_url, "Starting ZetaChain MCP HTTP server");

    let server = build_server(config);
    server.initialize().await?;

    let listener = tokio::net::TcpListener::bind(bind_socket).await?;
    info!(bind = %bind_socket, "HTTP server listening");

    let outcome = http::serve(listener, AppState::new(Arc::clone(&server))).await;
    server.close().await;
    outcome?;
    Ok(())
}
