//! MCP Server Entry Point
//!
//! Initializes logging, loads configuration and serves the angel tools over
//! SSE. The `call` subcommand runs one tool locally and prints its result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rmcp::model::RawContent;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use angel_mcp_server::core::{Config, McpServer, TransportService};
use angel_mcp_server::domains::tools::InvocationRequest;

#[derive(Debug, Parser)]
#[command(name = "angel-mcp-server", version, about = "Angel query MCP server over SSE")]
struct Cli {
    /// Address to bind to (overrides MCP_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides MCP_PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Log level (overrides MCP_LOG_LEVEL).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one tool and print its result instead of serving.
    Call {
        /// Tool name, e.g. `get_angel_details`.
        tool: String,

        /// Tool arguments as a JSON object.
        #[arg(long)]
        args: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment, then apply flags
    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.transport.host = host;
    }
    if let Some(port) = cli.port {
        config.transport.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    init_logging(&config.logging.level);

    let server = McpServer::new(config.clone())?;

    if let Some(Command::Call { tool, args }) = cli.command {
        return call_once(&server, tool, args.as_deref()).await;
    }

    info!("Starting {} v{}", config.server.name, config.server.version);

    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Invoke a tool once and print its text content to stdout.
async fn call_once(server: &McpServer, tool: String, args: Option<&str>) -> Result<()> {
    let arguments = args
        .map(serde_json::from_str::<serde_json::Map<String, serde_json::Value>>)
        .transpose()
        .context("--args must be a JSON object")?;

    let result = server
        .call_tool(InvocationRequest::new(tool, arguments), &CancellationToken::new())
        .await;

    for content in &result.content {
        if let RawContent::Text(text) = &content.raw {
            println!("{}", text.text);
        }
    }

    if result.is_error == Some(true) {
        anyhow::bail!("tool call failed");
    }
    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr so `call` output on stdout stays clean.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
