//! On-disk cache of server tool lists.
//!
//! One JSON file per server, named after a filesystem-safe form of the
//! server name. Entries carry a format version and a creation timestamp;
//! stale, mismatched or unreadable entries are treated as missing.
//!
//! Server names that sanitize to the same key share one cache file, so
//! `a/b` and `a_b` overwrite each other's entry.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::config::Settings;
use crate::mcp::Tool;

/// Version of the on-disk entry shape. Bump on incompatible changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// A persisted tool list for one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Server the tools belong to
    pub server_name: String,
    /// Tools as returned by the server
    pub tools: Vec<Tool>,
    /// Creation time (Unix epoch milliseconds)
    pub timestamp: u64,
    /// Entry shape version
    pub format_version: u32,
}

impl CacheEntry {
    /// Create an entry stamped with the current time and format version.
    pub fn new(server_name: &str, tools: &[Tool]) -> Self {
        Self {
            server_name: server_name.to_string(),
            tools: tools.to_vec(),
            timestamp: current_timestamp_ms(),
            format_version: CACHE_FORMAT_VERSION,
        }
    }

    /// Age of the entry relative to now.
    pub fn age(&self) -> Duration {
        Duration::from_millis(current_timestamp_ms().saturating_sub(self.timestamp))
    }
}

/// Summary of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStat {
    /// Server name stored in the entry
    pub server_name: String,
    /// Seconds since the entry was written
    pub age_seconds: u64,
    /// Number of cached tools
    pub tool_count: usize,
}

/// Tool list cache backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct ToolCache {
    dir: PathBuf,
    ttl: Duration,
    enabled: bool,
}

impl ToolCache {
    /// Create a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration, enabled: bool) -> Self {
        Self { dir: dir.into(), ttl, enabled }
    }

    /// Create a cache from resolved runtime settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.cache_dir.clone(), settings.cache_ttl, settings.cache_enabled)
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether `get`/`set` are active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Path of the entry file for a server.
    pub fn entry_path(&self, server_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_server_name(server_name)))
    }

    /// Look up a live entry. Every failure mode is a miss.
    pub fn get(&self, server_name: &str) -> Option<Vec<Tool>> {
        if !self.enabled {
            return None;
        }

        let path = self.entry_path(server_name);
        let entry = match read_entry(&path) {
            Ok(entry) => entry,
            Err(e) => {
                if path.exists() {
                    tracing::debug!(server = server_name, error = %e, "ignoring unreadable cache entry");
                }
                return None;
            }
        };

        if entry.format_version != CACHE_FORMAT_VERSION {
            tracing::debug!(
                server = server_name,
                found = entry.format_version,
                expected = CACHE_FORMAT_VERSION,
                "cache entry version mismatch"
            );
            return None;
        }

        let age = entry.age();
        if age > self.ttl {
            tracing::debug!(server = server_name, age_secs = age.as_secs(), "cache entry expired");
            return None;
        }

        tracing::debug!(server = server_name, tools = entry.tools.len(), "cache hit");
        Some(entry.tools)
    }

    /// Store a fresh entry, replacing any previous one. Failures are logged.
    pub fn set(&self, server_name: &str, tools: &[Tool]) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry::new(server_name, tools);
        if let Err(e) = self.write_entry(&entry) {
            tracing::warn!(server = server_name, error = %e, "failed to write tool cache");
        }
    }

    /// Write an entry wholesale via a temporary file and rename.
    pub fn write_entry(&self, entry: &CacheEntry) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.entry_path(&entry.server_name);
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        let content = serde_json::to_string_pretty(entry)?;

        fs::write(&tmp, content)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }

    /// Remove one server's entry. Returns whether a file was removed.
    pub fn clear(&self, server_name: &str) -> io::Result<bool> {
        match fs::remove_file(self.entry_path(server_name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Remove every entry. Returns the number of files removed.
    pub fn clear_all(&self) -> io::Result<usize> {
        let mut removed = 0;
        for path in self.entry_files()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }

    /// Async form of [`get`](Self::get); file I/O runs on the blocking pool.
    pub async fn load(&self, server_name: &str) -> Option<Vec<Tool>> {
        let (cache, name) = (self.clone(), server_name.to_string());
        match tokio::task::spawn_blocking(move || cache.get(&name)).await {
            Ok(tools) => tools,
            Err(e) => {
                tracing::debug!(server = server_name, error = %e, "cache read task failed");
                None
            }
        }
    }

    /// Async form of [`set`](Self::set); file I/O runs on the blocking pool.
    pub async fn store(&self, server_name: &str, tools: Vec<Tool>) {
        if !self.enabled {
            return;
        }
        let (cache, name) = (self.clone(), server_name.to_string());
        if let Err(e) = tokio::task::spawn_blocking(move || cache.set(&name, &tools)).await {
            tracing::warn!(server = server_name, error = %e, "cache write task failed");
        }
    }

    /// Summaries of all readable current-format entries, expired ones included.
    pub fn stats(&self) -> Vec<CacheStat> {
        let files = match self.entry_files() {
            Ok(files) => files,
            Err(e) => {
                tracing::debug!(dir = %self.dir.display(), error = %e, "cannot scan cache directory");
                return Vec::new();
            }
        };

        let mut stats: Vec<CacheStat> = files
            .iter()
            .filter_map(|path| read_entry(path).ok())
            .filter(|entry| entry.format_version == CACHE_FORMAT_VERSION)
            .map(|entry| CacheStat {
                age_seconds: entry.age().as_secs(),
                tool_count: entry.tools.len(),
                server_name: entry.server_name,
            })
            .collect();

        stats.sort_by(|a, b| a.server_name.cmp(&b.server_name));
        stats
    }

    fn entry_files(&self) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Map a server name to a file-name-safe key.
///
/// Every character outside `[A-Za-z0-9_-]` becomes `_`.
pub fn sanitize_server_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

fn read_entry(path: &Path) -> io::Result<CacheEntry> {
    let content = fs::read_to_string(path)?;
    let entry: CacheEntry = serde_json::from_str(&content)?;
    Ok(entry)
}

/// Current Unix time in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    fn tool(name: &str) -> Tool {
        Tool {
            name: name.to_string(),
            description: Some(format!("Test tool: {}", name)),
            input_schema: json!({"type": "object", "properties": {"path": {"type": "string"}}}),
        }
    }

    fn setup() -> (TempDir, ToolCache) {
        let temp = TempDir::new().unwrap();
        let cache = ToolCache::new(temp.path().join("cache"), TTL, true);
        (temp, cache)
    }

    fn aged_entry(server: &str, age: Duration) -> CacheEntry {
        CacheEntry {
            server_name: server.to_string(),
            tools: vec![tool("read_file")],
            timestamp: current_timestamp_ms() - age.as_millis() as u64,
            format_version: CACHE_FORMAT_VERSION,
        }
    }

    #[test]
    fn test_round_trip() {
        let (_temp, cache) = setup();
        let tools = vec![tool("read_file"), tool("write_file")];

        cache.set("filesystem", &tools);
        assert_eq!(cache.get("filesystem"), Some(tools));
    }

    #[test]
    fn test_round_trip_empty_list() {
        let (_temp, cache) = setup();
        cache.set("empty", &[]);
        assert_eq!(cache.get("empty"), Some(Vec::new()));
    }

    #[test]
    fn test_missing_entry() {
        let (_temp, cache) = setup();
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn test_expiry_boundaries() {
        let (_temp, cache) = setup();

        cache.write_entry(&aged_entry("old", TTL + Duration::from_secs(1))).unwrap();
        assert!(cache.get("old").is_none());

        cache.write_entry(&aged_entry("fresh", TTL - Duration::from_secs(1))).unwrap();
        assert!(cache.get("fresh").is_some());
    }

    #[test]
    fn test_expired_entry_not_deleted_on_read() {
        let (_temp, cache) = setup();
        cache.write_entry(&aged_entry("old", TTL * 2)).unwrap();

        assert!(cache.get("old").is_none());
        assert!(cache.entry_path("old").exists());
    }

    #[test]
    fn test_version_gate() {
        let (_temp, cache) = setup();
        let mut entry = aged_entry("versioned", Duration::ZERO);
        entry.format_version = CACHE_FORMAT_VERSION + 1;
        cache.write_entry(&entry).unwrap();

        assert!(cache.get("versioned").is_none());
    }

    #[test]
    fn test_corrupt_entry_is_miss() {
        let (_temp, cache) = setup();
        fs::create_dir_all(cache.dir()).unwrap();
        fs::write(cache.entry_path("broken"), "{ not json").unwrap();

        assert!(cache.get("broken").is_none());
    }

    #[test]
    fn test_disabled_cache() {
        let temp = TempDir::new().unwrap();
        let cache = ToolCache::new(temp.path(), TTL, false);

        cache.set("server", &[tool("a")]);
        assert!(!cache.entry_path("server").exists());
        assert!(cache.get("server").is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let (_temp, cache) = setup();
        cache.set("server", &[tool("a")]);
        cache.set("server", &[tool("b"), tool("c")]);

        let tools = cache.get("server").unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "b");
    }

    #[test]
    fn test_clear_single() {
        let (_temp, cache) = setup();
        cache.set("one", &[tool("a")]);
        cache.set("two", &[tool("b")]);

        assert!(cache.clear("one").unwrap());
        assert!(!cache.clear("one").unwrap());
        assert!(cache.get("one").is_none());
        assert!(cache.get("two").is_some());
    }

    #[test]
    fn test_clear_all() {
        let (_temp, cache) = setup();
        assert_eq!(cache.clear_all().unwrap(), 0);

        cache.set("one", &[tool("a")]);
        cache.set("two", &[tool("b")]);
        assert_eq!(cache.clear_all().unwrap(), 2);
        assert!(cache.stats().is_empty());
    }

    #[test]
    fn test_stats_include_expired_and_skip_corrupt() {
        let (_temp, cache) = setup();
        cache.set("fresh", &[tool("a"), tool("b")]);
        cache.write_entry(&aged_entry("stale", TTL * 3)).unwrap();
        fs::write(cache.entry_path("junk"), "garbage").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].server_name, "fresh");
        assert_eq!(stats[0].tool_count, 2);
        assert_eq!(stats[1].server_name, "stale");
        assert!(stats[1].age_seconds >= TTL.as_secs() * 3);
    }

    #[test]
    fn test_stats_skip_other_format_versions() {
        let (_temp, cache) = setup();
        cache.set("current", &[tool("a")]);
        let mut entry = aged_entry("legacy", Duration::ZERO);
        entry.format_version = CACHE_FORMAT_VERSION + 1;
        cache.write_entry(&entry).unwrap();

        let names: Vec<String> = cache.stats().into_iter().map(|s| s.server_name).collect();
        assert_eq!(names, vec!["current"]);
    }

    #[tokio::test]
    async fn test_async_load_and_store() {
        let (_temp, cache) = setup();
        assert!(cache.load("fs").await.is_none());

        cache.store("fs", vec![tool("read_file")]).await;
        let tools = cache.load("fs").await.unwrap();
        assert_eq!(tools[0].name, "read_file");
        assert_eq!(cache.get("fs"), Some(tools));
    }

    #[tokio::test]
    async fn test_async_store_disabled() {
        let temp = TempDir::new().unwrap();
        let cache = ToolCache::new(temp.path().join("cache"), TTL, false);
        cache.store("fs", vec![tool("a")]).await;
        assert!(!cache.dir().exists());
        assert!(cache.load("fs").await.is_none());
    }

    #[test]
    fn test_stats_missing_directory() {
        let temp = TempDir::new().unwrap();
        let cache = ToolCache::new(temp.path().join("absent"), TTL, true);
        assert!(cache.stats().is_empty());
    }

    #[test]
    fn test_sanitize_server_name() {
        assert_eq!(sanitize_server_name("github"), "github");
        assert_eq!(sanitize_server_name("my-server_2"), "my-server_2");
        assert_eq!(sanitize_server_name("a/b"), "a_b");
        assert_eq!(sanitize_server_name("../etc"), "___etc");
    }

    #[test]
    fn test_sanitized_names_collide() {
        let (_temp, cache) = setup();
        assert_eq!(cache.entry_path("a/b"), cache.entry_path("a_b"));

        cache.set("a/b", &[tool("first")]);
        cache.set("a_b", &[tool("second")]);
        assert_eq!(cache.get("a/b").unwrap()[0].name, "second");
    }

    #[test]
    fn test_entry_file_format() {
        let (_temp, cache) = setup();
        cache.set("fmt", &[tool("a")]);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(cache.entry_path("fmt")).unwrap()).unwrap();
        assert_eq!(raw["serverName"], "fmt");
        assert_eq!(raw["formatVersion"], CACHE_FORMAT_VERSION);
        assert!(raw["timestamp"].is_u64());
        assert_eq!(raw["tools"][0]["inputSchema"]["type"], "object");
    }
}
