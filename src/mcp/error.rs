//! MCP error types.

use std::path::PathBuf;

use super::protocol::JsonRpcError;
use crate::core::RetryError;

/// Error type for MCP session and transport operations.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Failed to spawn server process '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Working directory {path} is not accessible: {source}")]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Server closed the connection")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid server configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Retry(#[from] RetryError),
}

impl McpError {
    /// HTTP status code, if the server answered with a non-success status.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            McpError::HttpStatus { status, .. } => Some(*status),
            McpError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// JSON-RPC error code, if the server rejected the request.
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            McpError::JsonRpc(e) => Some(e.code),
            _ => None,
        }
    }
}
