//! `info`: one server's tools, or one tool's input schema.

use super::{print_json, CommandContext, OutputFormat};
use crate::core::with_retry;
use crate::error::CliError;
use crate::mcp::{with_session, McpError, ToolTarget};
use crate::output::{format_server_info, format_tool_schema};

/// Run the command.
pub async fn run(ctx: &CommandContext<'_>, target: &str, format: OutputFormat) -> Result<(), CliError> {
    let target = ToolTarget::parse(target).ok_or_else(|| {
        CliError::client(format!("Invalid target '{}'", target)).with_hint("use <server> or <server>/<tool>")
    })?;
    let config = ctx.server(&target.server)?;

    let budget = ctx.budget();
    let list_budget = ctx.budget();
    let label = format!("list tools from {}", target.server);

    let (server_info, tools) = with_session(ctx.connector, &target.server, config, &budget, |session| async move {
        let session = &*session;
        let tools = with_retry(&list_budget, &label, move || session.list_tools()).await?;
        Ok::<_, McpError>((session.server_info().cloned(), tools))
    })
    .await?;

    match target.tool {
        None => match format {
            OutputFormat::Json => print_json(&serde_json::json!({
                "server": target.server,
                "transport": config.transport_name(),
                "serverInfo": server_info,
                "tools": tools,
            }))?,
            OutputFormat::Text => {
                print!("{}", format_server_info(&target.server, config, server_info.as_ref(), &tools));
            }
        },
        Some(ref tool_name) => {
            let tool = tools.iter().find(|t| &t.name == tool_name).ok_or_else(|| {
                CliError::client(format!("Tool '{}' not found on server '{}'", tool_name, target.server))
                    .with_hint(format!("run `mcp-cli info {}` to see its tools", target.server))
            })?;
            match format {
                OutputFormat::Json => print_json(tool)?,
                OutputFormat::Text => print!("{}", format_tool_schema(&target.server, tool)),
            }
        }
    }

    Ok(())
}
