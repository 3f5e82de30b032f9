//! User-facing errors and exit codes.
//!
//! Every failure that reaches the top of a command is a [`CliError`]: a
//! category that decides the exit code, a message, and an optional hint
//! telling the user what to try next.

use serde::Serialize;

use crate::core::{is_transient, ENV_MAX_RETRIES, ENV_TIMEOUT};
use crate::mcp::{ConfigError, McpError, INVALID_PARAMS, METHOD_NOT_FOUND};

/// Exit code after SIGINT.
pub const EXIT_SIGINT: i32 = 130;

/// Exit code after SIGTERM.
pub const EXIT_SIGTERM: i32 = 143;

/// Error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Bad invocation or configuration
    ClientError,
    /// The server failed or misbehaved
    ServerError,
    /// The server could not be reached
    NetworkError,
    /// The server rejected our credentials
    AuthError,
}

impl ErrorKind {
    /// Process exit code for this category.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::ClientError => 1,
            ErrorKind::ServerError => 2,
            ErrorKind::NetworkError => 3,
            ErrorKind::AuthError => 4,
        }
    }

    /// Label used in text output.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::ClientError => "CLIENT_ERROR",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::AuthError => "AUTH_ERROR",
        }
    }
}

/// Error reported to the user.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct CliError {
    /// Category
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// What went wrong
    pub message: String,
    /// What to try next
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), hint: None }
    }

    /// Bad invocation or configuration.
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ClientError, message)
    }

    /// Server-side failure.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    /// Attach a hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Prefix the message with context.
    pub fn context(mut self, context: impl std::fmt::Display) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }

    /// Process exit code.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// Multi-line text rendering for stderr.
    pub fn render_text(&self) -> String {
        let mut output = format!("Error [{}]: {}", self.kind.label(), self.message);
        if let Some(ref hint) = self.hint {
            output.push_str(&format!("\n  Hint: {}", hint));
        }
        output
    }

    /// JSON rendering for stderr.
    pub fn render_json(&self) -> String {
        serde_json::json!({ "error": self }).to_string()
    }
}

impl From<McpError> for CliError {
    fn from(error: McpError) -> Self {
        let message = error.to_string();

        if let Some(status @ (401 | 403)) = error.http_status() {
            return Self::new(ErrorKind::AuthError, message).with_hint(format!(
                "the server answered {}; check the credentials in this server's \"headers\"",
                status
            ));
        }

        if let Some(code @ (METHOD_NOT_FOUND | INVALID_PARAMS)) = error.rpc_code() {
            let hint = if code == METHOD_NOT_FOUND {
                "the server does not support this request"
            } else {
                "check the arguments against the tool's input schema (mcp-cli info <server>/<tool>)"
            };
            return Self::client(message).with_hint(hint);
        }

        if is_transient(&error) {
            return Self::new(ErrorKind::NetworkError, message).with_hint(format!(
                "check that the server is reachable; retries are tuned with {} and {}",
                ENV_MAX_RETRIES, ENV_TIMEOUT
            ));
        }

        match error {
            McpError::Spawn { .. } | McpError::WorkingDirectory { .. } => Self::client(message)
                .with_hint("check the \"command\" and \"cwd\" for this server in your config"),
            McpError::InvalidConfig(_) => Self::client(message),
            _ => Self::server(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        let hint = match error {
            ConfigError::NotFound { .. } => Some(
                "create mcp_servers.json, or pass --config <FILE> or set MCP_CONFIG_PATH".to_string(),
            ),
            ConfigError::MissingEnvVar { ref var, .. } => Some(format!("export {} before running", var)),
            _ => None,
        };

        let err = Self::client(error.to_string());
        match hint {
            Some(hint) => err.with_hint(hint),
            None => err,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::client(error.to_string())
    }
}
