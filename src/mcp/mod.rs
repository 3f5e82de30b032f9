//! MCP (Model Context Protocol) client.
//!
//! This module implements the client side of MCP: reading the server
//! configuration file, opening stdio and HTTP transports, running the
//! handshake, and listing and calling tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 commands                      │
//! │      list · grep · info · call · cache        │
//! └──────────────────────────────────────────────┘
//!                      │ Connector / Session
//!      ┌───────────────┼───────────────┐
//!      ▼               ▼               ▼
//!  McpSession      McpSession      McpSession
//!  (stdio)         (stdio)         (http)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mcp_cli::core::RetryBudget;
//! use mcp_cli::mcp::{with_session, McpConfig, McpConnector};
//!
//! let config = McpConfig::load(None)?;
//! let server = config.get("github").unwrap();
//! let tools = with_session(&McpConnector::new(false), "github", server, &budget, |session| async move {
//!     session.list_tools().await
//! })
//! .await?;
//! ```

mod client;
mod config;
mod connection;
mod error;
mod http;
mod protocol;
mod stdio;
mod tools;
mod transport;

pub use client::{Connector, McpConnector, McpSession, Session};
pub use config::{
    candidate_paths, ConfigError, HttpServerConfig, McpConfig, ServerConfig, StdioServerConfig,
    CONFIG_FILE_NAME,
};
pub use connection::{connect, safe_close, with_session};
pub use error::McpError;
pub use http::{parse_sse_messages, HttpTransport, SESSION_HEADER};
pub use protocol::{
    CallToolParams, CallToolResult, EmbeddedResource, Implementation, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    ServerCapabilities, Tool, ToolContent, INVALID_PARAMS, METHOD_NOT_FOUND, PROTOCOL_VERSION,
};
pub use stdio::StdioTransport;
pub use tools::{
    extract_text_content, format_tool, parameters, parse_arguments, render_content, ToolParameter,
    ToolTarget,
};
pub use transport::{open_transport, Transport};
