//! MCP sessions.
//!
//! A session is an initialized connection to one server. [`Connector`] opens
//! sessions; the orchestration code only talks to these two traits, so tests
//! can swap in servers that live in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::config::ServerConfig;
use super::error::McpError;
use super::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, ListToolsParams,
    ListToolsResult, Tool,
};
use super::transport::{open_transport, Transport};

/// Upper bound on `tools/list` pages, guarding against cursor loops.
const MAX_TOOL_PAGES: usize = 100;

/// An initialized connection to one MCP server.
#[async_trait]
pub trait Session: Send + Sync {
    /// Server identity reported during the handshake.
    fn server_info(&self) -> Option<&InitializeResult>;

    /// Fetch every tool the server exposes.
    async fn list_tools(&self) -> Result<Vec<Tool>, McpError>;

    /// Invoke a tool.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<HashMap<String, Value>>,
    ) -> Result<CallToolResult, McpError>;

    /// Shut the session down and release its resources.
    async fn close(&self) -> Result<(), McpError>;
}

/// Opens sessions to configured servers.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and complete the handshake.
    async fn connect(&self, name: &str, config: &ServerConfig) -> Result<Box<dyn Session>, McpError>;
}

/// Session over a real transport.
pub struct McpSession {
    /// Server name
    name: String,
    /// Underlying transport; requests on one session are serialized
    transport: Mutex<Box<dyn Transport>>,
    /// Server info from initialization
    server_info: Option<InitializeResult>,
}

impl McpSession {
    /// Run the MCP handshake over an open transport.
    ///
    /// The transport is closed again if the handshake fails.
    pub async fn initialize(name: &str, mut transport: Box<dyn Transport>) -> Result<Self, McpError> {
        match handshake(transport.as_mut()).await {
            Ok(info) => {
                tracing::debug!(
                    server = name,
                    remote = %info.server_info.name,
                    version = info.server_info.version.as_deref().unwrap_or("unknown"),
                    protocol = %info.protocol_version,
                    "session initialized"
                );
                Ok(Self {
                    name: name.to_string(),
                    transport: Mutex::new(transport),
                    server_info: Some(info),
                })
            }
            Err(error) => {
                if let Err(close_error) = transport.close().await {
                    tracing::debug!(server = name, error = %close_error, "close after failed handshake");
                }
                Err(error)
            }
        }
    }

    /// Server name this session was opened for.
    pub fn name(&self) -> &str {
        &self.name
    }
}

async fn handshake(transport: &mut dyn Transport) -> Result<InitializeResult, McpError> {
    let params = serde_json::to_value(InitializeParams::default())?;
    let result = transport.request("initialize", Some(params)).await?;
    let info: InitializeResult = serde_json::from_value(result)
        .map_err(|e| McpError::Protocol(format!("invalid initialize result: {}", e)))?;
    transport.notify("notifications/initialized", None).await?;
    Ok(info)
}

#[async_trait]
impl Session for McpSession {
    fn server_info(&self) -> Option<&InitializeResult> {
        self.server_info.as_ref()
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        let mut transport = self.transport.lock().await;
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_TOOL_PAGES {
            let params = match cursor.take() {
                Some(cursor) => Some(serde_json::to_value(ListToolsParams { cursor: Some(cursor) })?),
                None => None,
            };
            let page: ListToolsResult =
                serde_json::from_value(transport.request("tools/list", params).await?)?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }

        Err(McpError::Protocol(format!(
            "{} returned more than {} pages of tools",
            self.name, MAX_TOOL_PAGES
        )))
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<HashMap<String, Value>>,
    ) -> Result<CallToolResult, McpError> {
        let params = CallToolParams { name: name.to_string(), arguments };
        let mut transport = self.transport.lock().await;
        let result = transport.request("tools/call", Some(serde_json::to_value(&params)?)).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn close(&self) -> Result<(), McpError> {
        self.transport.lock().await.close().await
    }
}

/// Connector that spawns processes and opens HTTP sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct McpConnector {
    /// Let server stderr through to the terminal
    debug: bool,
}

impl McpConnector {
    /// Create a connector.
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

#[async_trait]
impl Connector for McpConnector {
    async fn connect(&self, name: &str, config: &ServerConfig) -> Result<Box<dyn Session>, McpError> {
        let transport = open_transport(name, config, self.debug)?;
        let session = McpSession::initialize(name, transport).await?;
        Ok(Box::new(session))
    }
}
