//! mcp-cli - discover, search and invoke MCP server tools.
//!
//! Reads `mcp_servers.json`, talks to every configured server, and prints
//! what it finds.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcp_cli::commands::{self, CommandContext, OutputFormat};
use mcp_cli::error::{EXIT_SIGINT, EXIT_SIGTERM};
use mcp_cli::{CliError, McpConfig, McpConnector, Settings, ToolCache};

/// Discover, search and invoke MCP server tools
#[derive(Parser)]
#[command(name = "mcp-cli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the server config file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Bypass the tool cache
    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all servers and their tools (default)
    List {
        /// Show tool descriptions
        #[arg(short = 'd', long)]
        descriptions: bool,
    },

    /// Search tools by glob pattern
    Grep {
        /// Pattern matched against tool names, server/tool paths and descriptions
        pattern: String,

        /// Show tool descriptions
        #[arg(short = 'd', long)]
        descriptions: bool,
    },

    /// Show a server's tools or a tool's input schema
    Info {
        /// <server> or <server>/<tool>
        target: String,
    },

    /// Call a tool
    Call {
        /// <server>/<tool>
        target: String,

        /// Arguments as a JSON object (read from stdin when omitted)
        args: Option<String>,
    },

    /// Inspect or clear the tool cache
    Cache {
        /// Cache operation
        #[command(subcommand)]
        operation: CacheOperation,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheOperation {
    /// Show cached servers
    Stats,

    /// Remove cached tool lists
    Clear {
        /// Only clear this server
        server: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::from_env();
    let settings = if cli.no_cache { settings.without_cache() } else { settings };

    // Setup logging
    let filter = if cli.verbose || settings.debug { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    if let Some(Commands::Completions { shell }) = cli.command {
        cmd_completions(shell);
        return Ok(());
    }

    // Call arguments may be piped in
    let stdin_args = match cli.command {
        Some(Commands::Call { args: None, .. }) if !io::stdin().is_terminal() => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("Failed to read arguments from stdin")?;
            Some(buf)
        }
        _ => None,
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let code = runtime.block_on(async {
        tokio::select! {
            code = run(cli, settings, stdin_args) => code,
            code = shutdown_signal() => code,
        }
    });

    std::process::exit(code);
}

/// Run the command and turn its outcome into an exit code.
async fn run(cli: Cli, settings: Settings, stdin_args: Option<String>) -> i32 {
    let format = cli.format;
    match dispatch(cli, &settings, stdin_args).await {
        Ok(()) => 0,
        Err(err) => {
            match format {
                OutputFormat::Json => eprintln!("{}", err.render_json()),
                OutputFormat::Text => eprintln!("{}", err.render_text()),
            }
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, settings: &Settings, stdin_args: Option<String>) -> Result<(), CliError> {
    let cache = ToolCache::from_settings(settings);

    // Cache commands never need the server config
    if let Some(Commands::Cache { operation }) = cli.command {
        return match operation {
            CacheOperation::Stats => commands::cache::stats(&cache, settings.cache_ttl.as_secs(), cli.format),
            CacheOperation::Clear { server } => commands::cache::clear(&cache, server.as_deref()),
        };
    }

    let config_path = cli.config.clone().or_else(|| settings.config_path.clone());
    let config = McpConfig::load(config_path.as_deref())?;
    let connector = McpConnector::new(settings.debug || cli.verbose);
    let ctx = CommandContext::new(&config, settings, &connector, &cache);

    match cli.command {
        None => commands::list::run(&ctx, cli.format, false).await,
        Some(Commands::List { descriptions }) => commands::list::run(&ctx, cli.format, descriptions).await,
        Some(Commands::Grep { pattern, descriptions }) => {
            commands::grep::run(&ctx, &pattern, cli.format, descriptions).await
        }
        Some(Commands::Info { target }) => commands::info::run(&ctx, &target, cli.format).await,
        Some(Commands::Call { target, args }) => {
            let args = args.or(stdin_args);
            commands::call::run(&ctx, &target, args.as_deref(), cli.format).await
        }
        Some(Commands::Cache { .. } | Commands::Completions { .. }) => Ok(()),
    }
}

/// Resolve with the conventional exit code once SIGINT or SIGTERM arrives.
async fn shutdown_signal() -> i32 {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        if let Ok(mut terminate) = signal(SignalKind::terminate()) {
            return tokio::select! {
                code = interrupted() => code,
                _ = terminate.recv() => EXIT_SIGTERM,
            };
        }
    }

    interrupted().await
}

async fn interrupted() -> i32 {
    match tokio::signal::ctrl_c().await {
        Ok(()) => EXIT_SIGINT,
        // No handler could be installed; never resolve
        Err(_) => std::future::pending().await,
    }
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "mcp-cli", &mut io::stdout());
}
