//! Runtime settings for mcp-cli.
//!
//! Settings are read from the process environment once per invocation and
//! then passed explicitly to the retry engine, the orchestrator, and the
//! tool cache.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the cache TTL in seconds.
pub const ENV_CACHE_TTL: &str = "MCP_CACHE_TTL";
/// Environment variable that disables the tool cache.
pub const ENV_NO_CACHE: &str = "MCP_NO_CACHE";
/// Environment variable holding the per-operation timeout budget in seconds.
pub const ENV_TIMEOUT: &str = "MCP_TIMEOUT";
/// Environment variable holding the maximum number of servers in flight.
pub const ENV_CONCURRENCY: &str = "MCP_CONCURRENCY";
/// Environment variable holding the maximum number of retries.
pub const ENV_MAX_RETRIES: &str = "MCP_MAX_RETRIES";
/// Environment variable holding the base retry delay in milliseconds.
pub const ENV_RETRY_DELAY: &str = "MCP_RETRY_DELAY";
/// Environment variable enabling debug logging when present.
pub const ENV_DEBUG: &str = "MCP_DEBUG";
/// Environment variable overriding the cache directory.
pub const ENV_CACHE_DIR: &str = "MCP_CACHE_DIR";
/// Environment variable pointing at the server configuration file.
pub const ENV_CONFIG_PATH: &str = "MCP_CONFIG_PATH";

/// Default cache TTL (one hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
/// Default operation budget (30 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1800);
/// Default number of servers handled concurrently.
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential backoff.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// How long a cached tool list stays live.
    pub cache_ttl: Duration,

    /// Whether the on-disk tool cache is consulted and written.
    pub cache_enabled: bool,

    /// Directory holding cache entries.
    pub cache_dir: PathBuf,

    /// Total time budget for one retried operation.
    pub timeout: Duration,

    /// Maximum servers processed at once.
    pub concurrency: usize,

    /// Retries after the initial attempt (0 = single attempt).
    pub max_retries: u32,

    /// Base delay for exponential backoff.
    pub retry_delay: Duration,

    /// Debug logging requested through the environment.
    pub debug: bool,

    /// Config file path from the environment, if any.
    pub config_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_enabled: true,
            cache_dir: default_cache_dir(),
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            debug: false,
            config_path: None,
        }
    }
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    ///
    /// Unparseable or out-of-range values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache_ttl = positive_int(lookup(ENV_CACHE_TTL).as_deref())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        let cache_enabled = !lookup(ENV_NO_CACHE).as_deref().is_some_and(is_truthy);

        let cache_dir = lookup(ENV_CACHE_DIR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);

        let timeout = positive_int(lookup(ENV_TIMEOUT).as_deref())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        let concurrency = positive_int(lookup(ENV_CONCURRENCY).as_deref())
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_CONCURRENCY);

        let max_retries = lookup(ENV_MAX_RETRIES)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|n| *n >= 0)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let retry_delay = positive_int(lookup(ENV_RETRY_DELAY).as_deref())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RETRY_DELAY);

        let debug = lookup(ENV_DEBUG).is_some();

        let config_path = lookup(ENV_CONFIG_PATH)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Self {
            cache_ttl,
            cache_enabled,
            cache_dir,
            timeout,
            concurrency,
            max_retries,
            retry_delay,
            debug,
            config_path,
        }
    }

    /// Disable the tool cache for this invocation.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }
}

/// Default cache directory: `<user cache dir>/mcp-cli`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("mcp-cli")
}

fn positive_int(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .and_then(|n| u64::try_from(n).ok())
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
