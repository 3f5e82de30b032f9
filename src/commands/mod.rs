//! Command flows.
//!
//! `list` and `grep` fan out over every configured server with bounded
//! concurrency and isolate per-server failures. `info` and `call` talk to
//! one server and propagate its first fatal error. `cache` inspects and
//! clears the tool cache without contacting any server.

pub mod cache;
pub mod call;
pub mod grep;
pub mod info;
pub mod list;

use serde::Serialize;

use crate::core::{run_bounded, with_retry, RetryBudget, Settings, ToolCache};
use crate::error::CliError;
use crate::mcp::{with_session, Connector, McpConfig, McpError, ServerConfig, Tool};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Everything a command needs, resolved once per invocation.
pub struct CommandContext<'a> {
    /// Loaded server configuration
    pub config: &'a McpConfig,
    /// Runtime settings
    pub settings: &'a Settings,
    /// Opens sessions
    pub connector: &'a dyn Connector,
    /// Tool cache
    pub cache: &'a ToolCache,
}

impl<'a> CommandContext<'a> {
    /// Bundle the collaborators.
    pub fn new(
        config: &'a McpConfig,
        settings: &'a Settings,
        connector: &'a dyn Connector,
        cache: &'a ToolCache,
    ) -> Self {
        Self { config, settings, connector, cache }
    }

    /// Fresh retry budget for one logical operation.
    pub fn budget(&self) -> RetryBudget {
        RetryBudget::from_settings(self.settings)
    }

    /// Look up a server, or fail with the list of known names.
    pub fn server(&self, name: &str) -> Result<&'a ServerConfig, CliError> {
        self.config.get(name).ok_or_else(|| {
            let known = self.config.server_names();
            let hint = if known.is_empty() {
                "no servers are configured".to_string()
            } else {
                format!("available servers: {}", known.join(", "))
            };
            CliError::client(format!("Server '{}' not found", name)).with_hint(hint)
        })
    }
}

/// Outcome of fetching one server's tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerTools {
    /// Server name
    pub server: String,
    /// Tools, or the error message that prevented listing them
    pub outcome: Result<Vec<Tool>, String>,
}

impl ServerTools {
    /// Tools if the server answered, otherwise an empty slice.
    pub fn tools(&self) -> &[Tool] {
        self.outcome.as_deref().unwrap_or(&[])
    }

    /// Error message if the server failed.
    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

/// JSON shape of one server's result.
#[derive(Debug, Serialize)]
pub struct ServerToolsView<'a> {
    /// Server name
    pub server: &'a str,
    /// Tools, empty when the server failed
    pub tools: &'a [Tool],
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> From<&'a ServerTools> for ServerToolsView<'a> {
    fn from(result: &'a ServerTools) -> Self {
        Self { server: &result.server, tools: result.tools(), error: result.error() }
    }
}

/// How a fan-out unit obtains a server's tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always ask the server; refresh the cache on success
    WriteThrough,
    /// Use a live cache entry if there is one; populate on a miss
    ReadThrough,
}

/// Connect, list tools (both retried), and close.
pub async fn fetch_tools(
    ctx: &CommandContext<'_>,
    name: &str,
    config: &ServerConfig,
) -> Result<Vec<Tool>, McpError> {
    let budget = ctx.budget();
    let label = format!("list tools from {}", name);
    let list_budget = ctx.budget();

    with_session(ctx.connector, name, config, &budget, |session| async move {
        let session = &*session;
        with_retry(&list_budget, &label, move || session.list_tools()).await
    })
    .await
}

/// Fetch every configured server's tools with bounded concurrency.
///
/// Results come back sorted by server name; failures are captured per
/// server and never abort the others.
pub async fn collect_tools(ctx: &CommandContext<'_>, policy: CachePolicy) -> Vec<ServerTools> {
    let entries: Vec<(&str, &ServerConfig)> =
        ctx.config.servers.iter().map(|(name, config)| (name.as_str(), config)).collect();

    let mut results = run_bounded(&entries, ctx.settings.concurrency, |entry, _| {
        let (name, config) = *entry;
        fetch_one(ctx, name, config, policy)
    })
    .await;

    results.sort_by(|a, b| a.server.cmp(&b.server));
    results
}

async fn fetch_one(
    ctx: &CommandContext<'_>,
    name: &str,
    config: &ServerConfig,
    policy: CachePolicy,
) -> ServerTools {
    if policy == CachePolicy::ReadThrough {
        if let Some(tools) = ctx.cache.load(name).await {
            return ServerTools { server: name.to_string(), outcome: Ok(tools) };
        }
        tracing::debug!(server = name, "cache miss");
    }

    let outcome = match fetch_tools(ctx, name, config).await {
        Ok(tools) => {
            ctx.cache.store(name, tools.clone()).await;
            Ok(tools)
        }
        Err(e) => {
            tracing::debug!(server = name, error = %e, "server failed");
            Err(e.to_string())
        }
    };

    ServerTools { server: name.to_string(), outcome }
}

/// One-line warning naming every failed server, if any failed.
pub fn failure_warning(results: &[ServerTools]) -> Option<String> {
    let failed: Vec<&str> =
        results.iter().filter(|r| r.outcome.is_err()).map(|r| r.server.as_str()).collect();
    if failed.is_empty() {
        return None;
    }
    Some(format!(
        "Warning: failed to connect to {} server(s): {}",
        failed.len(),
        failed.join(", ")
    ))
}

/// Print the aggregate failure warning to stderr.
pub fn report_failures(results: &[ServerTools]) {
    if let Some(warning) = failure_warning(results) {
        eprintln!("{}", warning);
    }
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::client(format!("failed to render JSON: {}", e)))?;
    println!("{json}");
    Ok(())
}
