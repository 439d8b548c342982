//! Stdio transport.
//!
//! stdout carries JSON-RPC frames only; everything else goes to stderr.

use rmcp::service::{serve_server, RoleServer, RunningService};
use rmcp::transport::io::stdio;

use super::tools::DevOpsServer;
use crate::error::{AppError, McpError};

/// Serves a [`DevOpsServer`] over stdin/stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioTransport;

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Starts serving. The returned service runs until the client
    /// disconnects; await [`RunningService::waiting`] to block on it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Mcp`] if the initialization handshake fails.
    pub async fn serve(
        self,
        server: DevOpsServer,
    ) -> Result<RunningService<RoleServer, DevOpsServer>, AppError> {
        let (stdin, stdout) = stdio();

        serve_server(server, (stdin, stdout)).await.map_err(|e| {
            AppError::Mcp(McpError::Internal {
                message: e.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_transport_new_and_default() {
        let transport = StdioTransport::new();
        assert_eq!(format!("{transport:?}"), format!("{:?}", StdioTransport::default()));
    }
}
