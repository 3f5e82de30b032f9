//! `grep`: search tools across all servers by glob pattern.
//!
//! Live cache entries are used instead of connecting; misses connect and
//! populate the cache.

use super::{
    collect_tools, print_json, report_failures, CachePolicy, CommandContext, OutputFormat,
    ServerTools,
};
use crate::core::GlobPattern;
use crate::error::CliError;
use crate::output::{format_matches, ToolMatch};

/// Fetch every server's tools, preferring the cache.
pub async fn collect(ctx: &CommandContext<'_>) -> Vec<ServerTools> {
    collect_tools(ctx, CachePolicy::ReadThrough).await
}

/// Tools whose name, `server/name` path, or description matches.
pub fn search(results: &[ServerTools], pattern: &GlobPattern) -> Vec<ToolMatch> {
    let mut matches = Vec::new();
    for result in results {
        for tool in result.tools() {
            let path = format!("{}/{}", result.server, tool.name);
            let hit = pattern.is_match(&tool.name)
                || pattern.is_match(&path)
                || tool.description.as_deref().is_some_and(|desc| pattern.is_match(desc));
            if hit {
                matches.push(ToolMatch { server: result.server.clone(), tool: tool.clone() });
            }
        }
    }
    matches
}

/// Run the command.
pub async fn run(
    ctx: &CommandContext<'_>,
    pattern: &str,
    format: OutputFormat,
    with_descriptions: bool,
) -> Result<(), CliError> {
    let glob = GlobPattern::new(pattern)
        .map_err(|e| CliError::client(format!("Invalid pattern '{}': {}", pattern, e)))?;

    if ctx.config.is_empty() {
        eprintln!("No MCP servers configured.");
        return Ok(());
    }

    let results = collect(ctx).await;
    let matches = search(&results, &glob);

    match format {
        OutputFormat::Json => print_json(&matches)?,
        OutputFormat::Text if matches.is_empty() => {
            eprintln!("No tools found matching '{}'", pattern);
        }
        OutputFormat::Text => print!("{}", format_matches(&matches, with_descriptions)),
    }

    report_failures(&results);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mcp::Tool;

    fn tool(name: &str, description: &str) -> Tool {
        Tool {
            name: name.to_string(),
            description: Some(description.to_string()),
            input_schema: json!({"type": "object"}),
        }
    }

    fn results() -> Vec<ServerTools> {
        vec![
            ServerTools {
                server: "fs".to_string(),
                outcome: Ok(vec![tool("read_file", "Read a file"), tool("list_dir", "List a directory")]),
            },
            ServerTools { server: "down".to_string(), outcome: Err("refused".to_string()) },
            ServerTools {
                server: "github".to_string(),
                outcome: Ok(vec![tool("create_issue", "Open an issue")]),
            },
        ]
    }

    fn names(matches: &[ToolMatch]) -> Vec<String> {
        matches.iter().map(|m| format!("{}/{}", m.server, m.tool.name)).collect()
    }

    #[test]
    fn test_matches_bare_name() {
        let matches = search(&results(), &GlobPattern::new("*file*").unwrap());
        assert_eq!(names(&matches), vec!["fs/read_file"]);
    }

    #[test]
    fn test_matches_server_path() {
        let matches = search(&results(), &GlobPattern::new("github/*").unwrap());
        assert_eq!(names(&matches), vec!["github/create_issue"]);
    }

    #[test]
    fn test_matches_description() {
        let matches = search(&results(), &GlobPattern::new("*DIRECTORY*").unwrap());
        assert_eq!(names(&matches), vec!["fs/list_dir"]);
    }

    #[test]
    fn test_empty_pattern_matches_all() {
        let matches = search(&results(), &GlobPattern::new("").unwrap());
        assert_eq!(names(&matches), vec!["fs/read_file", "fs/list_dir", "github/create_issue"]);
    }

    #[test]
    fn test_no_match() {
        assert!(search(&results(), &GlobPattern::new("nothing").unwrap()).is_empty());
    }
}
