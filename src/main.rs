//! Azure DevOps MCP Server binary entry point.
//!
//! Usage: `azure-devops-mcp [organization]`. The organization falls back
//! to `AZURE_DEVOPS_ORG`. All logs go to stderr; stdout is reserved for
//! MCP JSON-RPC messages.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use azure_devops_mcp::config::{Config, DEFAULT_LOG_LEVEL};
use azure_devops_mcp::server::McpServer;

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    // Before the subscriber, so LOG_LEVEL from .env applies.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
                .parse()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "azure-devops-mcp starting");

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env: {e}"),
    }

    let config = match Config::load(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        organization = %config.organization,
        timeout_ms = config.request_timeout_ms,
        "configuration loaded"
    );

    let server = McpServer::new(config);
    if let Err(e) = server.run_stdio().await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    tracing::info!("azure-devops-mcp shutdown complete");
}
