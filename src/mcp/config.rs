//! Server configuration file.
//!
//! The file is a JSON object with a `mcpServers` map from server name to a
//! server definition. A definition either launches a local process
//! (`command`, `args`, `env`, `cwd`) or points at a remote endpoint
//! (`url`, `headers`, `timeout`). `${VAR}` and `$VAR` references in string
//! values are replaced from the environment when the file is loaded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File name searched for in the working and home directories.
pub const CONFIG_FILE_NAME: &str = "mcp_servers.json";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No config file found (searched: {searched})")]
    NotFound { searched: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Environment variable '{var}' referenced by server '{server}' is not set")]
    MissingEnvVar { server: String, var: String },

    #[error("Server '{server}': {message}")]
    InvalidServer { server: String, message: String },
}

/// A local server launched as a child process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StdioServerConfig {
    /// Command to run
    pub command: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Environment overlay on top of the inherited environment
    pub env: BTreeMap<String, String>,
    /// Working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

/// A remote server reached over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpServerConfig {
    /// Endpoint URL
    pub url: String,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    /// Per-request timeout
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_secs")]
    pub timeout: Option<Duration>,
}

fn serialize_secs<S: serde::Serializer>(
    value: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(duration) => serializer.serialize_f64(duration.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

/// A configured server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServerConfig {
    /// Local child process speaking line-delimited JSON-RPC
    Stdio(StdioServerConfig),
    /// Remote streamable-HTTP endpoint
    Http(HttpServerConfig),
}

impl ServerConfig {
    /// Short transport name for display.
    pub fn transport_name(&self) -> &'static str {
        match self {
            ServerConfig::Stdio(_) => "stdio",
            ServerConfig::Http(_) => "http",
        }
    }

    /// One-line summary of how the server is reached.
    pub fn summary(&self) -> String {
        match self {
            ServerConfig::Stdio(stdio) if stdio.args.is_empty() => stdio.command.clone(),
            ServerConfig::Stdio(stdio) => format!("{} {}", stdio.command, stdio.args.join(" ")),
            ServerConfig::Http(http) => http.url.clone(),
        }
    }
}

/// Raw server entry as it appears in the file.
#[derive(Debug, Default, Deserialize)]
struct RawServerConfig {
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    cwd: Option<String>,
    url: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    timeout: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawConfigFile {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: BTreeMap<String, RawServerConfig>,
}

/// Loaded server configuration.
#[derive(Debug, Clone, Default)]
pub struct McpConfig {
    /// File the configuration came from, if any
    pub path: Option<PathBuf>,
    /// Servers keyed by name, in name order
    pub servers: BTreeMap<String, ServerConfig>,
}

impl McpConfig {
    /// Build a configuration directly from server definitions.
    pub fn from_servers<I>(servers: I) -> Self
    where
        I: IntoIterator<Item = (String, ServerConfig)>,
    {
        Self { path: None, servers: servers.into_iter().collect() }
    }

    /// Load from an explicit path, or search the default locations.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let candidates = candidate_paths();
        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Self::load_from_file(path),
            None => Err(ConfigError::NotFound {
                searched: candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Load a specific file, substituting from the process environment.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), "loading server config");

        let mut config = Self::parse(&content, path, |var| std::env::var(var).ok())?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse file content with a custom variable lookup.
    pub fn parse<F>(content: &str, path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfigFile = serde_json::from_str(content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

        let mut servers = BTreeMap::new();
        for (name, entry) in raw.mcp_servers {
            let server = resolve_server(&name, entry, &lookup)?;
            servers.insert(name, server);
        }

        Ok(Self { path: None, servers })
    }

    /// Look up a server by name.
    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.get(name)
    }

    /// Configured server names in order.
    pub fn server_names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    /// Check if no servers are configured.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

/// Default config locations, in lookup order.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}", CONFIG_FILE_NAME)));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mcp").join(CONFIG_FILE_NAME));
    }
    paths
}

fn resolve_server<F>(name: &str, raw: RawServerConfig, lookup: &F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let invalid = |message: &str| ConfigError::InvalidServer {
        server: name.to_string(),
        message: message.to_string(),
    };
    let expand = |value: &str| substitute(value, name, lookup);

    match (raw.command, raw.url) {
        (Some(_), Some(_)) => Err(invalid("has both 'command' and 'url'; exactly one is required")),
        (None, None) => Err(invalid("needs either 'command' or 'url'")),
        (Some(command), None) => {
            let command = expand(&command)?;
            if command.trim().is_empty() {
                return Err(invalid("'command' is empty"));
            }

            let args = raw.args.iter().map(|a| expand(a)).collect::<Result<Vec<_>, _>>()?;
            let mut env = BTreeMap::new();
            for (key, value) in &raw.env {
                env.insert(key.clone(), expand(value)?);
            }
            let cwd = raw.cwd.as_deref().map(&expand).transpose()?.map(PathBuf::from);

            Ok(ServerConfig::Stdio(StdioServerConfig { command, args, env, cwd }))
        }
        (None, Some(url)) => {
            let url = expand(&url)?;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid("'url' must start with http:// or https://"));
            }

            let mut headers = BTreeMap::new();
            for (key, value) in &raw.headers {
                headers.insert(key.clone(), expand(value)?);
            }

            let timeout = match raw.timeout {
                None => None,
                Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
                Some(_) => return Err(invalid("'timeout' must be a positive number of seconds")),
            };

            Ok(ServerConfig::Http(HttpServerConfig { url, headers, timeout }))
        }
    }
}

fn substitute<F>(value: &str, server: &str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    shellexpand::env_with_context(value, |var: &str| {
        lookup(var).map(Some).ok_or(std::env::VarError::NotPresent)
    })
    .map(|expanded| expanded.into_owned())
    .map_err(|e| ConfigError::MissingEnvVar { server: server.to_string(), var: e.var_name })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serial_test::serial;
    use tempfile::TempDir;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    fn parse(content: &str) -> Result<McpConfig, ConfigError> {
        McpConfig::parse(content, Path::new("test.json"), vars(&[("TOKEN", "s3cret")]))
    }

    #[test]
    fn test_parse_both_transports() {
        let config = parse(
            r#"{
                "mcpServers": {
                    "remote": {"url": "https://example.com/mcp", "headers": {"Authorization": "Bearer ${TOKEN}"}, "timeout": 30},
                    "local": {"command": "npx", "args": ["-y", "server"], "env": {"KEY": "$TOKEN"}, "cwd": "/tmp"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.server_names(), vec!["local", "remote"]);

        match config.get("local").unwrap() {
            ServerConfig::Stdio(stdio) => {
                assert_eq!(stdio.command, "npx");
                assert_eq!(stdio.args, vec!["-y", "server"]);
                assert_eq!(stdio.env["KEY"], "s3cret");
                assert_eq!(stdio.cwd.as_deref(), Some(Path::new("/tmp")));
            }
            other => panic!("expected stdio, got {:?}", other),
        }

        match config.get("remote").unwrap() {
            ServerConfig::Http(http) => {
                assert_eq!(http.headers["Authorization"], "Bearer s3cret");
                assert_eq!(http.timeout, Some(Duration::from_secs(30)));
            }
            other => panic!("expected http, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let err = parse(r#"{"mcpServers": {"a": {"command": "run", "args": ["${NOPE}"]}}}"#)
            .unwrap_err();
        match err {
            ConfigError::MissingEnvVar { server, var } => {
                assert_eq!(server, "a");
                assert_eq!(var, "NOPE");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_exactly_one_transport() {
        let both = parse(r#"{"mcpServers": {"x": {"command": "a", "url": "http://b"}}}"#);
        assert!(matches!(both, Err(ConfigError::InvalidServer { .. })));

        let neither = parse(r#"{"mcpServers": {"x": {"args": []}}}"#);
        assert!(matches!(neither, Err(ConfigError::InvalidServer { .. })));
    }

    #[test]
    fn test_url_scheme_and_timeout_validation() {
        let bad_scheme = parse(r#"{"mcpServers": {"x": {"url": "ftp://host"}}}"#);
        assert!(matches!(bad_scheme, Err(ConfigError::InvalidServer { .. })));

        let bad_timeout = parse(r#"{"mcpServers": {"x": {"url": "http://host", "timeout": 0}}}"#);
        assert!(matches!(bad_timeout, Err(ConfigError::InvalidServer { .. })));
    }

    #[test]
    fn test_empty_and_missing_servers_map() {
        assert!(parse(r#"{"mcpServers": {}}"#).unwrap().is_empty());
        assert!(parse(r#"{}"#).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse("{not json"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config =
            parse(r#"{"mcpServers": {"x": {"command": "a", "disabled": false}}, "other": 1}"#)
                .unwrap();
        assert_eq!(config.server_names(), vec!["x"]);
    }

    #[test]
    fn test_summary() {
        let stdio = ServerConfig::Stdio(StdioServerConfig {
            command: "node".to_string(),
            args: vec!["server.js".to_string()],
            env: BTreeMap::new(),
            cwd: None,
        });
        assert_eq!(stdio.summary(), "node server.js");
        assert_eq!(stdio.transport_name(), "stdio");
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = McpConfig::load(Some(&temp.path().join("absent.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    #[serial(config_env)]
    fn test_load_from_file_uses_process_env() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"mcpServers": {"x": {"command": "${MCP_CLI_TEST_COMMAND}"}}}"#,
        )
        .unwrap();

        std::env::set_var("MCP_CLI_TEST_COMMAND", "my-server");
        let config = McpConfig::load(Some(&path));
        std::env::remove_var("MCP_CLI_TEST_COMMAND");

        let config = config.unwrap();
        assert_eq!(config.path.as_deref(), Some(path.as_path()));
        assert_eq!(config.get("x").unwrap().summary(), "my-server");
    }
}
