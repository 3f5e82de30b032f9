//! `cache`: inspect or clear the tool cache.

use super::{print_json, OutputFormat};
use crate::core::ToolCache;
use crate::error::CliError;
use crate::output::format_cache_stats;

/// Print one line per cached server.
pub fn stats(cache: &ToolCache, ttl_secs: u64, format: OutputFormat) -> Result<(), CliError> {
    let stats = cache.stats();
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "directory": cache.dir(),
            "enabled": cache.is_enabled(),
            "ttlSeconds": ttl_secs,
            "entries": stats,
        })),
        OutputFormat::Text => {
            let dir = cache.dir().display().to_string();
            print!("{}", format_cache_stats(&dir, cache.is_enabled(), ttl_secs, &stats));
            Ok(())
        }
    }
}

/// Remove one server's entry, or all of them.
pub fn clear(cache: &ToolCache, server: Option<&str>) -> Result<(), CliError> {
    let message = match server {
        Some(name) => {
            let removed = cache
                .clear(name)
                .map_err(|e| CliError::client(format!("Failed to clear cache for '{}': {}", name, e)))?;
            if removed {
                format!("Cleared cache for '{}'", name)
            } else {
                format!("No cache entry for '{}'", name)
            }
        }
        None => {
            let removed = cache
                .clear_all()
                .map_err(|e| CliError::client(format!("Failed to clear cache: {}", e)))?;
            format!("Cleared {} cache entr{}", removed, if removed == 1 { "y" } else { "ies" })
        }
    };

    println!("{}", message);
    Ok(())
}
