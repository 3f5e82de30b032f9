//! Text rendering for command results.
//!
//! Every function returns a `String` so the exact layout can be tested;
//! commands decide where it is printed.

use chrono::{Local, TimeDelta};

use crate::commands::ServerTools;
use crate::core::CacheStat;
use crate::mcp::{format_tool, parameters, InitializeResult, ServerConfig, Tool};

/// A tool that matched a search, with the server it came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ToolMatch {
    /// Server name
    pub server: String,
    /// The matching tool
    pub tool: Tool,
}

/// Render `list` output: each server followed by its tools.
pub fn format_server_list(results: &[ServerTools], with_descriptions: bool) -> String {
    let mut output = String::new();

    for result in results {
        match result.outcome {
            Ok(ref tools) => {
                output.push_str(&format!("{} ({} tools)\n", result.server, tools.len()));
                for tool in tools {
                    output.push_str(&format!("  {}", tool.name));
                    if with_descriptions {
                        if let Some(desc) = short_description(tool) {
                            output.push_str(&format!(" - {}", desc));
                        }
                    }
                    output.push('\n');
                }
            }
            Err(ref error) => {
                output.push_str(&format!("{} (error: {})\n", result.server, error));
            }
        }
    }

    output
}

/// Render `grep` output: one `server/tool` line per match.
pub fn format_matches(matches: &[ToolMatch], with_descriptions: bool) -> String {
    let mut output = String::new();
    for found in matches {
        output.push_str(&format!("{}/{}", found.server, found.tool.name));
        if with_descriptions {
            if let Some(desc) = short_description(&found.tool) {
                output.push_str(&format!(" - {}", desc));
            }
        }
        output.push('\n');
    }
    output
}

/// Render `info <server>`.
pub fn format_server_info(
    name: &str,
    config: &ServerConfig,
    info: Option<&InitializeResult>,
    tools: &[Tool],
) -> String {
    let mut output = format!("Server: {}\n", name);
    output.push_str(&format!("Transport: {} ({})\n", config.transport_name(), config.summary()));

    if let Some(info) = info {
        let version = info.server_info.version.as_deref().unwrap_or("unknown version");
        output.push_str(&format!("Implementation: {} {}\n", info.server_info.name, version));
        output.push_str(&format!("Protocol: {}\n", info.protocol_version));
        if let Some(ref instructions) = info.instructions {
            output.push_str(&format!("Instructions: {}\n", instructions.trim()));
        }
    }

    output.push_str(&format!("\nTools ({}):\n", tools.len()));
    for tool in tools {
        for line in format_tool(tool, None).lines() {
            output.push_str(&format!("  {}\n", line));
        }
    }

    output
}

/// Render `info <server>/<tool>`.
pub fn format_tool_schema(server: &str, tool: &Tool) -> String {
    let mut output = format!("Tool: {}\nServer: {}\n", tool.name, server);

    if let Some(ref desc) = tool.description {
        output.push_str(&format!("Description: {}\n", desc.trim()));
    }

    let params = parameters(tool);
    if !params.is_empty() {
        output.push_str("\nParameters:\n");
        for param in params {
            let marker = if param.required { ", required" } else { "" };
            output.push_str(&format!("  {} ({}{})", param.name, param.kind, marker));
            if let Some(desc) = param.description {
                output.push_str(&format!(": {}", desc));
            }
            output.push('\n');
        }
    }

    let schema =
        serde_json::to_string_pretty(&tool.input_schema).unwrap_or_else(|_| tool.input_schema.to_string());
    output.push_str(&format!("\nInput schema:\n{}\n", schema));
    output
}

/// Render `cache stats`.
pub fn format_cache_stats(dir: &str, enabled: bool, ttl_secs: u64, stats: &[CacheStat]) -> String {
    let state = if enabled { "enabled" } else { "disabled" };
    let mut output = format!("Cache: {} ({}, TTL {}s)\n", dir, state, ttl_secs);

    if stats.is_empty() {
        output.push_str("  No cached servers.\n");
        return output;
    }

    for stat in stats {
        let expired = if stat.age_seconds > ttl_secs { ", expired" } else { "" };
        output.push_str(&format!(
            "  {}: {} tools, cached {} ({}{})\n",
            stat.server_name,
            stat.tool_count,
            cached_at(stat.age_seconds),
            format_age(stat.age_seconds),
            expired
        ));
    }

    output
}

/// Human-readable age, e.g. "5m ago".
pub fn format_age(age_seconds: u64) -> String {
    match age_seconds {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}m ago", age_seconds / 60),
        3600..=86_399 => format!("{}h ago", age_seconds / 3600),
        _ => format!("{}d ago", age_seconds / 86_400),
    }
}

fn cached_at(age_seconds: u64) -> String {
    let age = TimeDelta::try_seconds(i64::try_from(age_seconds).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::zero());
    (Local::now() - age).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// First line of a tool's description.
fn short_description(tool: &Tool) -> Option<&str> {
    tool.description
        .as_deref()
        .and_then(|desc| desc.lines().map(str::trim).find(|line| !line.is_empty()))
}
