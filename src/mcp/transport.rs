//! Transport abstraction for MCP.
//!
//! A transport carries JSON-RPC requests to one server and hands back the
//! matching result. Stdio and HTTP servers implement it differently, but
//! sessions only see this trait.

use async_trait::async_trait;
use serde_json::Value;

use super::config::ServerConfig;
use super::error::McpError;
use super::http::HttpTransport;
use super::protocol::{
    IncomingMessage, JsonRpcRequest, JsonRpcResponse, RequestId, METHOD_NOT_FOUND,
};
use super::stdio::StdioTransport;

/// Request/response channel to a single MCP server.
#[async_trait]
pub trait Transport: Send {
    /// Send a request and wait for its result.
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, McpError>;

    /// Send a notification; no response is expected.
    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), McpError>;

    /// Release the underlying process or remote session.
    async fn close(&mut self) -> Result<(), McpError>;
}

/// Open the transport a server definition asks for.
pub fn open_transport(
    name: &str,
    config: &ServerConfig,
    debug: bool,
) -> Result<Box<dyn Transport>, McpError> {
    match config {
        ServerConfig::Stdio(stdio) => Ok(Box::new(StdioTransport::spawn(name, stdio, debug)?)),
        ServerConfig::Http(http) => Ok(Box::new(HttpTransport::new(name, http)?)),
    }
}

/// Reply for a request the server sent to us.
///
/// Only `ping` is answered; anything else gets "method not found".
pub(crate) fn reply_to_server_request(request: &JsonRpcRequest) -> JsonRpcResponse {
    if request.method == "ping" {
        JsonRpcResponse::success(request.id.clone(), serde_json::json!({}))
    } else {
        JsonRpcResponse::failure(
            request.id.clone(),
            METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        )
    }
}

/// Pick the response to `id` out of an incoming message, if it is one.
pub(crate) fn match_response(message: IncomingMessage, id: &RequestId) -> Option<JsonRpcResponse> {
    match message {
        IncomingMessage::Response(response) if &response.id == id => Some(response),
        _ => None,
    }
}
