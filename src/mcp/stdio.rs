//! Stdio transport.
//!
//! Spawns the server as a child process and exchanges newline-delimited
//! JSON-RPC messages over its stdin and stdout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::config::StdioServerConfig;
use super::error::McpError;
use super::protocol::{IncomingMessage, JsonRpcNotification, JsonRpcRequest, RequestId};
use super::transport::{match_response, reply_to_server_request, Transport};

/// How long a server gets to exit after stdin is closed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// MCP server process reached over stdin/stdout.
pub struct StdioTransport {
    /// Server name, for logging
    name: String,
    /// Server process
    child: Option<Child>,
    /// Stdin writer
    stdin: Option<ChildStdin>,
    /// Stdout reader
    stdout: Option<BufReader<ChildStdout>>,
    /// Request ID counter
    next_id: i64,
}

impl StdioTransport {
    /// Spawn the server process.
    ///
    /// The child inherits our environment with the configured overlay on
    /// top. Its stderr is discarded unless `debug` is set.
    pub fn spawn(name: &str, config: &StdioServerConfig, debug: bool) -> Result<Self, McpError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if debug { Stdio::inherit() } else { Stdio::null() })
            .kill_on_drop(true);

        if let Some(ref cwd) = config.cwd {
            if let Err(source) = std::fs::metadata(cwd) {
                return Err(McpError::WorkingDirectory { path: cwd.clone(), source });
            }
            cmd.current_dir(cwd);
        }

        let mut child = cmd
            .spawn()
            .map_err(|source| McpError::Spawn { command: config.command.clone(), source })?;
        tracing::debug!(server = name, pid = ?child.id(), "spawned server process");

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Protocol("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Protocol("Failed to capture stdout".to_string()))?;

        Ok(Self {
            name: name.to_string(),
            child: Some(child),
            stdin: Some(stdin),
            stdout: Some(BufReader::new(stdout)),
            next_id: 1,
        })
    }

    async fn write_line(&mut self, json: &str) -> Result<(), McpError> {
        let stdin = self.stdin.as_mut().ok_or(McpError::ConnectionClosed)?;
        tracing::debug!("MCP {} <- {}", self.name, json);
        stdin.write_all(json.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read messages until the response to `id` arrives.
    async fn read_response(&mut self, id: &RequestId) -> Result<Value, McpError> {
        let mut line = String::new();
        loop {
            line.clear();
            let stdout = self.stdout.as_mut().ok_or(McpError::ConnectionClosed)?;
            if stdout.read_line(&mut line).await? == 0 {
                return Err(McpError::ConnectionClosed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            tracing::debug!("MCP {} -> {}", self.name, trimmed);

            // Servers sometimes log to stdout; anything that is not JSON-RPC is skipped
            let Some(message) =
                serde_json::from_str::<Value>(trimmed).ok().and_then(IncomingMessage::from_value)
            else {
                continue;
            };

            match message {
                IncomingMessage::Request(ref request) => {
                    let reply = serde_json::to_string(&reply_to_server_request(request))?;
                    self.write_line(&reply).await?;
                    continue;
                }
                IncomingMessage::Notification(ref notification) => {
                    tracing::debug!(server = %self.name, method = %notification.method, "server notification");
                    continue;
                }
                IncomingMessage::Response(_) => {}
            }

            if let Some(response) = match_response(message, id) {
                return Ok(response.into_value()?);
            }
        }
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = RequestId::Number(self.next_id);
        self.next_id += 1;

        let request = JsonRpcRequest::new(id.clone(), method, params);
        self.write_line(&serde_json::to_string(&request)?).await?;
        self.read_response(&id).await
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let notification = JsonRpcNotification::new(method, params);
        self.write_line(&serde_json::to_string(&notification)?).await
    }

    async fn close(&mut self) -> Result<(), McpError> {
        // Closing stdin is the shutdown signal for stdio servers
        self.stdin.take();
        self.stdout.take();

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    tracing::debug!(server = %self.name, %status, "server process exited");
                }
                Err(_) => {
                    tracing::debug!(server = %self.name, "server did not exit, killing");
                    child.kill().await?;
                }
            }
        }

        Ok(())
    }
}
