//! CLI Integration Tests
//!
//! Tests the command-line interface end-to-end.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Get the binary to test, isolated from the caller's environment.
fn mcp_cli(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mcp-cli").unwrap();
    cmd.env("MCP_CACHE_DIR", temp.path().join("cache"))
        .env("MCP_MAX_RETRIES", "0")
        .env("MCP_TIMEOUT", "20")
        .env_remove("MCP_CONFIG_PATH")
        .env_remove("MCP_NO_CACHE")
        .env_remove("MCP_DEBUG")
        .current_dir(temp.path());
    cmd
}

/// A tiny MCP server: answers initialize, tools/list and tools/call.
#[cfg(unix)]
const FAKE_SERVER: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\([0-9]*\),.*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2025-03-26","capabilities":{"tools":{}},"serverInfo":{"name":"fake-server","version":"0.1.0"}}}\n' "$id" ;;
    *'"method":"tools/list"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo","description":"Echo text back","inputSchema":{"type":"object","properties":{"text":{"type":"string"}},"required":["text"]}},{"name":"fail","description":"Always fails","inputSchema":{"type":"object"}}]}}\n' "$id" ;;
    *'"name":"fail"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"it broke"}],"isError":true}}\n' "$id" ;;
    *'"method":"tools/call"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"pong"}]}}\n' "$id" ;;
  esac
done
"#;

/// Write a config with the fake server and a server whose command is missing.
#[cfg(unix)]
fn write_config(temp: &TempDir) {
    let script = temp.child("server.sh");
    script.write_str(FAKE_SERVER).unwrap();

    let config = serde_json::json!({
        "mcpServers": {
            "fake": {"command": "sh", "args": [script.path()]},
            "broken": {"command": "definitely-not-an-installed-mcp-server"}
        }
    });
    temp.child("mcp_servers.json").write_str(&config.to_string()).unwrap();
}

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    let temp = TempDir::new().unwrap();
    mcp_cli(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Discover, search and invoke MCP server tools"));
}

#[test]
fn test_version_flag() {
    let temp = TempDir::new().unwrap();
    mcp_cli(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_completions_bash() {
    let temp = TempDir::new().unwrap();
    mcp_cli(&temp).args(["completions", "bash"]).assert().success().stdout(predicate::str::contains("mcp-cli"));
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[test]
fn test_missing_config_file() {
    let temp = TempDir::new().unwrap();
    mcp_cli(&temp)
        .args(["-c", "absent.json", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CLIENT_ERROR"));
}

#[test]
fn test_invalid_config_json() {
    let temp = TempDir::new().unwrap();
    temp.child("mcp_servers.json").write_str("{ nope").unwrap();
    mcp_cli(&temp).arg("list").assert().code(1).stderr(predicate::str::contains("Invalid JSON"));
}

#[test]
fn test_empty_config() {
    let temp = TempDir::new().unwrap();
    temp.child("mcp_servers.json").write_str(r#"{"mcpServers": {}}"#).unwrap();
    mcp_cli(&temp).assert().success().stderr(predicate::str::contains("No MCP servers configured"));
}

#[test]
fn test_unknown_server() {
    let temp = TempDir::new().unwrap();
    temp.child("mcp_servers.json")
        .write_str(r#"{"mcpServers": {"only": {"command": "true"}}}"#)
        .unwrap();
    mcp_cli(&temp)
        .args(["info", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Server 'nope' not found"))
        .stderr(predicate::str::contains("available servers: only"));
}

#[test]
fn test_error_report_as_json() {
    let temp = TempDir::new().unwrap();
    temp.child("mcp_servers.json").write_str(r#"{"mcpServers": {}}"#).unwrap();
    mcp_cli(&temp)
        .args(["--format", "json", "info", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(r#""type":"CLIENT_ERROR""#));
}

#[test]
fn test_call_rejects_invalid_json_arguments() {
    let temp = TempDir::new().unwrap();
    temp.child("mcp_servers.json")
        .write_str(r#"{"mcpServers": {"only": {"command": "true"}}}"#)
        .unwrap();
    mcp_cli(&temp)
        .args(["call", "only/tool", "{not json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid JSON arguments"));
}

#[test]
fn test_call_requires_tool() {
    let temp = TempDir::new().unwrap();
    temp.child("mcp_servers.json").write_str(r#"{"mcpServers": {}}"#).unwrap();
    mcp_cli(&temp).args(["call", "server-only", "{}"]).assert().code(1);
}

// ============================================================================
// Cache Commands
// ============================================================================

#[test]
fn test_cache_stats_empty() {
    let temp = TempDir::new().unwrap();
    mcp_cli(&temp).args(["cache", "stats"]).assert().success().stdout(predicate::str::contains("No cached servers"));
}

#[test]
fn test_cache_clear_missing_dir() {
    let temp = TempDir::new().unwrap();
    mcp_cli(&temp).args(["cache", "clear"]).assert().success().stdout(predicate::str::contains("Cleared 0 cache entries"));
}

// ============================================================================
// Live Server Tests
// ============================================================================

#[cfg(unix)]
#[test]
fn test_list_isolates_failed_server() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp)
        .args(["list", "-d"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fake (2 tools)"))
        .stdout(predicate::str::contains("  echo - Echo text back"))
        .stdout(predicate::str::contains("broken (error:"))
        .stderr(predicate::str::contains("Warning: failed to connect to 1 server(s): broken"));
}

#[cfg(unix)]
#[test]
fn test_list_json() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    let output = mcp_cli(&temp).args(["--format", "json", "list"]).output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let servers = parsed.as_array().unwrap();
    assert_eq!(servers[0]["server"], "broken");
    assert!(servers[0]["error"].is_string());
    assert_eq!(servers[1]["server"], "fake");
    assert_eq!(servers[1]["tools"][0]["name"], "echo");
}

#[cfg(unix)]
#[test]
fn test_grep_populates_cache() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp).args(["grep", "*ech*"]).assert().success().stdout(predicate::str::contains("fake/echo"));

    mcp_cli(&temp)
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fake: 2 tools"));

    mcp_cli(&temp)
        .args(["cache", "clear", "fake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared cache for 'fake'"));
}

#[cfg(unix)]
#[test]
fn test_grep_without_matches() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp)
        .args(["--no-cache", "grep", "zzz*"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No tools found matching 'zzz*'"));
}

#[cfg(unix)]
#[test]
fn test_info_tool_schema() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp)
        .args(["info", "fake/echo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tool: echo"))
        .stdout(predicate::str::contains("text (string, required)"));
}

#[cfg(unix)]
#[test]
fn test_info_server() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp)
        .args(["info", "fake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Implementation: fake-server 0.1.0"))
        .stdout(predicate::str::contains("Tools (2):"));
}

#[cfg(unix)]
#[test]
fn test_info_unknown_tool() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp)
        .args(["info", "fake/missing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Tool 'missing' not found on server 'fake'"));
}

#[cfg(unix)]
#[test]
fn test_call_tool() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp)
        .args(["call", "fake/echo", r#"{"text": "ping"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("pong"));
}

#[cfg(unix)]
#[test]
fn test_call_arguments_from_stdin() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp)
        .args(["call", "fake/echo"])
        .write_stdin(r#"{"text": "ping"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("pong"));
}

#[cfg(unix)]
#[test]
fn test_call_tool_error_exits_with_server_status() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp)
        .args(["call", "fake/fail", "{}"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("it broke"))
        .stderr(predicate::str::contains("SERVER_ERROR"));
}

#[cfg(unix)]
#[test]
fn test_call_missing_command_is_client_error() {
    let temp = TempDir::new().unwrap();
    write_config(&temp);

    mcp_cli(&temp)
        .args(["call", "broken/anything", "{}"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to spawn server process"));
}
