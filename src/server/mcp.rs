//! Main MCP server orchestration.

use crate::config::Config;
use crate::devops::DevOpsClient;
use crate::error::AppError;

use super::tools::DevOpsServer;
use super::transport::StdioTransport;
use super::types::AppState;

/// Wires configuration, client and transport together.
#[derive(Debug)]
pub struct McpServer {
    config: Config,
}

impl McpServer {
    /// Creates a new MCP server with the given configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Builds the tool server without starting a transport.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Api`] if the HTTP client cannot be created.
    pub fn build(&self) -> Result<DevOpsServer, AppError> {
        let client = DevOpsClient::from_config(&self.config)?;
        let state = AppState::new(client, self.config.clone());
        Ok(DevOpsServer::new(state))
    }

    /// Runs the server over stdio until the client disconnects.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the HTTP client cannot be created
    /// - the MCP handshake fails
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run_stdio(&self) -> Result<(), AppError> {
        let server = self.build()?;

        tracing::info!(
            organization = %self.config.organization,
            tools = server.tool_count(),
            "azure-devops-mcp ready"
        );

        let running = StdioTransport::new().serve(server).await?;
        tokio::select! {
            _ = running.waiting() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, shutting down");
            }
        }

        Ok(())
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}
