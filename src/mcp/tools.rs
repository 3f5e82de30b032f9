//! Tool helpers.
//!
//! Addressing tools as `server/tool`, reading parameters out of input
//! schemas, parsing call arguments, and flattening call results to text.

use std::collections::HashMap;

use serde_json::Value;

use super::protocol::{CallToolResult, Tool, ToolContent};

/// A `server` or `server/tool` reference from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolTarget {
    /// Server name
    pub server: String,
    /// Tool name, if one was given
    pub tool: Option<String>,
}

impl ToolTarget {
    /// Parse a target, splitting on the first `/`.
    ///
    /// Returns `None` for an empty server or an empty tool after the slash.
    pub fn parse(target: &str) -> Option<Self> {
        match target.split_once('/') {
            Some((server, tool)) if !server.is_empty() && !tool.is_empty() => {
                Some(Self { server: server.to_string(), tool: Some(tool.to_string()) })
            }
            Some(_) => None,
            None if target.is_empty() => None,
            None => Some(Self { server: target.to_string(), tool: None }),
        }
    }
}

impl std::fmt::Display for ToolTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tool {
            Some(ref tool) => write!(f, "{}/{}", self.server, tool),
            None => write!(f, "{}", self.server),
        }
    }
}

/// One parameter from a tool's input schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// JSON Schema type, or "any"
    pub kind: String,
    /// Parameter description
    pub description: Option<String>,
    /// Whether the schema lists it as required
    pub required: bool,
}

/// Parameters declared in a tool's input schema.
pub fn parameters(tool: &Tool) -> Vec<ToolParameter> {
    let required: Vec<&str> = tool
        .input_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = tool.input_schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, schema)| ToolParameter {
            name: name.clone(),
            kind: schema_type(schema),
            description: schema.get("description").and_then(Value::as_str).map(str::to_string),
            required: required.contains(&name.as_str()),
        })
        .collect()
}

fn schema_type(schema: &Value) -> String {
    match schema.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(Value::Array(kinds)) => {
            kinds.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(" | ")
        }
        _ => "any".to_string(),
    }
}

/// Format a tool with its parameters for display.
pub fn format_tool(tool: &Tool, server: Option<&str>) -> String {
    let mut output = String::new();

    match server {
        Some(srv) => output.push_str(&format!("{}/{}", srv, tool.name)),
        None => output.push_str(&tool.name),
    }

    if let Some(ref desc) = tool.description {
        output.push_str(&format!("\n  {}", desc.trim()));
    }

    let params = parameters(tool);
    if !params.is_empty() {
        output.push_str("\n  Parameters:");
        for param in params {
            let marker = if param.required { ", required" } else { "" };
            output.push_str(&format!("\n    - {} ({}{})", param.name, param.kind, marker));
            if let Some(desc) = param.description {
                output.push_str(&format!(": {}", desc));
            }
        }
    }

    output
}

/// Parse call arguments; they must form a JSON object.
pub fn parse_arguments(raw: &str) -> Result<HashMap<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(format!("arguments must be a JSON object, got {}", json_kind(&other))),
        Err(e) => Err(format!("invalid JSON arguments: {}", e)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Extract text content from tool result.
pub fn extract_text_content(result: &CallToolResult) -> String {
    result.content.iter().filter_map(ToolContent::as_text).collect::<Vec<_>>().join("\n")
}

/// Render every content block, with placeholders for non-text content.
pub fn render_content(result: &CallToolResult) -> String {
    let mut blocks: Vec<String> = result
        .content
        .iter()
        .map(|content| match content {
            ToolContent::Text { text } => text.clone(),
            ToolContent::Image { mime_type, data } => {
                format!("[image: {}, {} bytes base64]", mime_type, data.len())
            }
            ToolContent::Audio { mime_type, data } => {
                format!("[audio: {}, {} bytes base64]", mime_type, data.len())
            }
            ToolContent::Resource { resource } => match resource.text {
                Some(ref text) => text.clone(),
                None => format!("[resource: {}]", resource.uri),
            },
            ToolContent::ResourceLink { uri, .. } => format!("[resource link: {}]", uri),
            ToolContent::Unknown => "[unsupported content]".to_string(),
        })
        .collect();

    if blocks.is_empty() {
        if let Some(ref structured) = result.structured_content {
            blocks.push(serde_json::to_string_pretty(structured).unwrap_or_default());
        }
    }

    blocks.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn create_test_tool(name: &str) -> Tool {
        Tool {
            name: name.to_string(),
            description: Some(format!("Test tool: {}", name)),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "File path"},
                    "limit": {"type": ["integer", "null"]},
                    "opts": {}
                },
                "required": ["path"]
            }),
        }
    }

    #[test]
    fn test_target_parsing() {
        assert_eq!(
            ToolTarget::parse("github/create_issue"),
            Some(ToolTarget { server: "github".into(), tool: Some("create_issue".into()) })
        );
        assert_eq!(ToolTarget::parse("github"), Some(ToolTarget { server: "github".into(), tool: None }));
        assert_eq!(
            ToolTarget::parse("a/b/c").unwrap().tool.as_deref(),
            Some("b/c")
        );
        assert!(ToolTarget::parse("").is_none());
        assert!(ToolTarget::parse("/tool").is_none());
        assert!(ToolTarget::parse("server/").is_none());
    }

    #[test]
    fn test_parameters() {
        let params = parameters(&create_test_tool("read"));
        assert_eq!(params.len(), 3);

        let path = params.iter().find(|p| p.name == "path").unwrap();
        assert!(path.required);
        assert_eq!(path.kind, "string");
        assert_eq!(path.description.as_deref(), Some("File path"));

        let limit = params.iter().find(|p| p.name == "limit").unwrap();
        assert_eq!(limit.kind, "integer | null");
        assert!(!limit.required);

        let opts = params.iter().find(|p| p.name == "opts").unwrap();
        assert_eq!(opts.kind, "any");
    }

    #[test]
    fn test_format_tool() {
        let output = format_tool(&create_test_tool("read"), Some("fs"));
        assert!(output.starts_with("fs/read"));
        assert!(output.contains("Test tool: read"));
        assert!(output.contains("- path (string, required): File path"));
    }

    #[test]
    fn test_parse_arguments() {
        let args = parse_arguments(r#"{"path": "/tmp", "n": 2}"#).unwrap();
        assert_eq!(args["path"], "/tmp");
        assert_eq!(args["n"], 2);

        assert!(parse_arguments("").unwrap().is_empty());
        assert!(parse_arguments("[1]").unwrap_err().contains("an array"));
        assert!(parse_arguments("{oops").unwrap_err().starts_with("invalid JSON"));
    }

    #[test]
    fn test_render_content() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "line one"},
                {"type": "image", "data": "AAAA", "mimeType": "image/png"},
                {"type": "resource", "resource": {"uri": "file:///x"}}
            ]
        }))
        .unwrap();

        let rendered = render_content(&result);
        assert_eq!(
            rendered,
            "line one\n[image: image/png, 4 bytes base64]\n[resource: file:///x]"
        );
        assert_eq!(extract_text_content(&result), "line one");
    }

    #[test]
    fn test_render_structured_only() {
        let result: CallToolResult =
            serde_json::from_value(json!({"content": [], "structuredContent": {"ok": true}})).unwrap();
        assert!(render_content(&result).contains("\"ok\": true"));
    }
}
