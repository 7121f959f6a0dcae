//! MCP (Model Context Protocol) server implementation.
//!
//! This module provides an MCP server that exposes fintrack functionality as tools
//! for AI agent integration. The server communicates via JSON-RPC over stdio.

/// Checks if the server has been initialized and returns an error if not.
macro_rules! require_init {
    ($self:expr) => {
        if !$self.check_initialized().await {
            return Self::uninitialized();
        }
    };
}

mod mcp_utils;
mod tools;

use crate::error::{ErrorType, IntoResult};
use crate::{App, Config, Mode};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::model::{
    CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::transport::stdio;
use rmcp::ErrorData as McpError;
use rmcp::{tool_handler, ServerHandler, ServiceExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The fintrack MCP server.
///
/// All tools share one `App`, so edits made through one tool are visible to the next, and
/// background pushes are collected as calls come in.
#[derive(Clone)]
pub struct FintrackServer {
    initialized: Arc<Mutex<bool>>,
    app: Arc<Mutex<App>>,
    tool_router: ToolRouter<FintrackServer>,
}

impl FintrackServer {
    pub fn new(app: Arc<Mutex<App>>) -> Self {
        Self {
            initialized: Arc::new(Mutex::new(false)),
            app,
            tool_router: Self::tool_router(),
        }
    }

    async fn check_initialized(&self) -> bool {
        *self.initialized.lock().await
    }

    fn uninitialized() -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::error(vec![rmcp::model::Content::text(
            "You have not yet initialized the service. Please call initialize_service first.",
        )]))
    }
}

#[tool_handler]
impl ServerHandler for FintrackServer {
    /// Returns server information sent to the MCP client during initialization. Agents tend to
    /// skim `instructions`, so the tools also require an `initialize_service` call first.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fintrack".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(include_str!("docs/INTRO.md").into()),
        }
    }
}

/// Transport type for the MCP server.
#[derive(Debug, Default)]
pub(crate) enum Io {
    #[default]
    Stdio,
    /// Mock transport for testing - holds one end of a duplex channel.
    #[cfg(test)]
    Mock(tokio::io::DuplexStream),
}

/// Runs the MCP server with stdio transport or mock transport. This function starts the MCP server
/// and blocks until the client disconnects or an error occurs. Pending background pushes are
/// awaited before it returns.
///
/// # Arguments
/// - `config`: The `Config` object
/// - `mode`: Whether we sync with Google Drive or with a local test directory
/// - `io`: Whether we are using stdio as the transport or using mock io for testing
///
pub(crate) async fn run_server(config: Config, mode: Mode, io: Io) -> crate::Result<()> {
    let app = Arc::new(Mutex::new(App::open(config, mode).await?));
    let server = FintrackServer::new(app.clone());
    info!("Starting MCP server...");

    let service = match io {
        Io::Stdio => server
            .serve(stdio())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))
            .pub_result(ErrorType::Service)?,
        #[cfg(test)]
        Io::Mock(stream) => server
            .serve(stream)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))
            .pub_result(ErrorType::Service)?,
    };

    info!("MCP server running, waiting for requests...");

    // Wait for the server to complete (client disconnects or error)
    service
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))
        .pub_result(ErrorType::Service)?;

    if let Err(e) = app.lock().await.settle().await {
        warn!("A background sync failed before shutdown: {e}");
    }
    info!("MCP server shut down");
    Ok(())
}
