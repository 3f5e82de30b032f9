#![allow(clippy::format_push_string)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

//! # mcp-cli
//!
//! Discover, search, and invoke the tools of many MCP (Model Context
//! Protocol) servers from one command line.
//!
//! Servers are declared in `mcp_servers.json`, either as local processes
//! spoken to over stdio or as remote streamable-HTTP endpoints.
//!
//! ## Features
//!
//! - **Fan-out**: lists and searches every server at once with bounded concurrency
//! - **Resilience**: transient connection failures are retried with jittered backoff
//! - **Caching**: tool lists are cached on disk so searches skip slow servers
//! - **Globs**: `mcp-cli grep 'github/*issue*'`
//!
//! ## Quick Start
//!
//! ```bash
//! # List every server and its tools
//! mcp-cli
//!
//! # Show a tool's input schema
//! mcp-cli info filesystem/read_file
//!
//! # Call it
//! mcp-cli call filesystem/read_file '{"path": "README.md"}'
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::use_self)]

pub mod commands;
pub mod core;
pub mod error;
pub mod mcp;
pub mod output;

// Re-export commonly used types
pub use commands::{CommandContext, OutputFormat, ServerTools};
pub use core::{Settings, ToolCache};
pub use error::{CliError, ErrorKind};
pub use mcp::{McpConfig, McpConnector, McpError, ServerConfig, Tool};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "mcp-cli";
