//! HTTP transport.
//!
//! Streamable HTTP: every JSON-RPC message is POSTed to the server URL and
//! the reply comes back either as a JSON body or as a short
//! `text/event-stream`. A session id handed out by the server is echoed on
//! later requests and released with DELETE on close.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::config::HttpServerConfig;
use super::error::McpError;
use super::protocol::{IncomingMessage, JsonRpcNotification, JsonRpcRequest, RequestId};
use super::transport::{match_response, Transport};

/// Header carrying the server-assigned session id.
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

/// MCP server reached over HTTP.
pub struct HttpTransport {
    /// Server name, for logging
    name: String,
    /// HTTP client with default headers applied
    client: Client,
    /// Endpoint URL
    url: String,
    /// Session id assigned by the server
    session_id: Option<String>,
    /// Request ID counter
    next_id: i64,
}

impl HttpTransport {
    /// Build a transport for the configured endpoint.
    pub fn new(name: &str, config: &HttpServerConfig) -> Result<Self, McpError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/event-stream"));

        for (key, value) in &config.headers {
            let header_name = HeaderName::try_from(key.as_str())
                .map_err(|e| McpError::InvalidConfig(format!("header name '{}': {}", key, e)))?;
            let header_value = HeaderValue::try_from(value.as_str())
                .map_err(|e| McpError::InvalidConfig(format!("header '{}' value: {}", key, e)))?;
            headers.insert(header_name, header_value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            name: name.to_string(),
            client: builder.build()?,
            url: config.url.clone(),
            session_id: None,
            next_id: 1,
        })
    }

    /// POST one message and return the decoded body, if any.
    async fn post(&mut self, body: String) -> Result<Vec<Value>, McpError> {
        debug!("MCP {} <- {}", self.name, body);

        let mut request = self.client.post(&self.url).body(body);
        if let Some(ref session_id) = self.session_id {
            request = request.header(SESSION_HEADER, session_id);
        }
        let response = request.send().await?;

        if let Some(session_id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            if self.session_id.as_deref() != Some(session_id) {
                debug!(server = %self.name, session_id, "session established");
                self.session_id = Some(session_id.to_string());
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::HttpStatus { status: status.as_u16(), body: body.trim().to_string() });
        }
        if status == StatusCode::ACCEPTED || status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/event-stream"));
        let text = response.text().await?;
        debug!("MCP {} -> {}", self.name, text.trim());

        if is_event_stream {
            return Ok(parse_sse_messages(&text));
        }
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&text)? {
            Value::Array(batch) => Ok(batch),
            single => Ok(vec![single]),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = RequestId::Number(self.next_id);
        self.next_id += 1;

        let request = JsonRpcRequest::new(id.clone(), method, params);
        let messages = self.post(serde_json::to_string(&request)?).await?;

        for message in messages.into_iter().filter_map(IncomingMessage::from_value) {
            if let IncomingMessage::Notification(ref notification) = message {
                debug!(server = %self.name, method = %notification.method, "server notification");
                continue;
            }
            if let Some(response) = match_response(message, &id) {
                return Ok(response.into_value()?);
            }
        }

        Err(McpError::Protocol(format!("no response to '{}' in server reply", method)))
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let notification = JsonRpcNotification::new(method, params);
        self.post(serde_json::to_string(&notification)?).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), McpError> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };

        let response =
            self.client.delete(&self.url).header(SESSION_HEADER, &session_id).send().await?;

        // Servers that do not support explicit termination answer 405
        let status = response.status();
        if !status.is_success() && status != StatusCode::METHOD_NOT_ALLOWED {
            debug!(server = %self.name, %status, "session termination rejected");
        }
        Ok(())
    }
}

/// Extract the JSON payloads from a `text/event-stream` body.
///
/// Events are separated by blank lines; multiple `data:` lines in one event
/// are joined with newlines. Payloads that are not JSON are dropped.
pub fn parse_sse_messages(body: &str) -> Vec<Value> {
    let mut messages = Vec::new();
    let mut data = String::new();

    let mut flush = |data: &mut String| {
        if !data.is_empty() {
            if let Ok(value) = serde_json::from_str::<Value>(data) {
                messages.push(value);
            }
            data.clear();
        }
    };

    for line in body.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            flush(&mut data);
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    flush(&mut data);

    messages
}
