//! `call`: invoke one tool with JSON arguments.
//!
//! The connection is retried; the call itself is not, since tools may have
//! side effects.

use super::{print_json, CommandContext, OutputFormat};
use crate::error::CliError;
use crate::mcp::{parse_arguments, render_content, with_session, ToolTarget};

/// Run the command.
///
/// A result flagged `isError` is printed and then reported as a server error.
pub async fn run(
    ctx: &CommandContext<'_>,
    target: &str,
    arguments: Option<&str>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let (server, tool) = match ToolTarget::parse(target) {
        Some(ToolTarget { server, tool: Some(tool) }) => (server, tool),
        _ => {
            return Err(CliError::client(format!("Invalid target '{}'", target))
                .with_hint("use <server>/<tool>, e.g. mcp-cli call filesystem/read_file '{\"path\": \"README.md\"}'"));
        }
    };

    let arguments = parse_arguments(arguments.unwrap_or_default()).map_err(|e| {
        CliError::client(e).with_hint(format!("run `mcp-cli info {}/{}` for the input schema", server, tool))
    })?;
    let config = ctx.server(&server)?;

    let budget = ctx.budget();
    let tool_name = tool.clone();
    let result = with_session(ctx.connector, &server, config, &budget, |session| async move {
        session.call_tool(&tool_name, Some(arguments)).await
    })
    .await
    .map_err(|e| CliError::from(e).context(format!("{}/{}", server, tool)))?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => {
            let rendered = render_content(&result);
            if !rendered.is_empty() {
                println!("{}", rendered);
            }
        }
    }

    if result.is_error() {
        return Err(CliError::server(format!("Tool '{}/{}' reported an error", server, tool)));
    }
    Ok(())
}
