//! `list`: every configured server and its tools.
//!
//! Always asks the servers; the cache is refreshed but never read.

use super::{
    collect_tools, print_json, report_failures, CachePolicy, CommandContext, OutputFormat,
    ServerTools, ServerToolsView,
};
use crate::error::CliError;
use crate::output::format_server_list;

/// Fetch every server's tools, refreshing the cache.
pub async fn collect(ctx: &CommandContext<'_>) -> Vec<ServerTools> {
    collect_tools(ctx, CachePolicy::WriteThrough).await
}

/// Run the command.
pub async fn run(
    ctx: &CommandContext<'_>,
    format: OutputFormat,
    with_descriptions: bool,
) -> Result<(), CliError> {
    if ctx.config.is_empty() {
        eprintln!("No MCP servers configured.");
        return Ok(());
    }

    let results = collect(ctx).await;

    match format {
        OutputFormat::Json => {
            let views: Vec<ServerToolsView<'_>> = results.iter().map(ServerToolsView::from).collect();
            print_json(&views)?;
        }
        OutputFormat::Text => print!("{}", format_server_list(&results, with_descriptions)),
    }

    report_failures(&results);
    Ok(())
}
