//! Core building blocks for mcp-cli.
//!
//! This module contains the pieces that do not speak MCP themselves:
//! settings, retry and error classification, bounded concurrency,
//! the tool cache, and glob matching.

mod cache;
mod config;
mod glob;
mod parallel;
mod retry;

pub use cache::{
    current_timestamp_ms, sanitize_server_name, CacheEntry, CacheStat, ToolCache,
    CACHE_FORMAT_VERSION,
};
pub use config::{
    Settings, DEFAULT_CACHE_TTL, DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY,
    DEFAULT_TIMEOUT, ENV_CACHE_DIR, ENV_CACHE_TTL, ENV_CONCURRENCY, ENV_CONFIG_PATH, ENV_DEBUG,
    ENV_MAX_RETRIES, ENV_NO_CACHE, ENV_RETRY_DELAY, ENV_TIMEOUT,
};
pub use glob::{glob_to_regex, GlobPattern};
pub use parallel::run_bounded;
pub use retry::{is_transient, is_transient_message, with_retry, RetryBudget, RetryError};
