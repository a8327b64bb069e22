//! scryfall-mcp: MCP server exposing Magic: The Gathering card data
//!
//! Bridges MCP-speaking hosts to the Scryfall card database: a `search`
//! tool for full-text card queries and a `fetch` tool for full card
//! records, plus a rendered-card viewer resource for app-capable hosts.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use scryfall_mcp::config;
use scryfall_mcp::mcp::server::McpServer;
use scryfall_mcp::scryfall::ScryfallClient;

/// MCP server exposing Magic: The Gathering card data from Scryfall.
///
/// Provides `search` and `fetch` tools backed by the Scryfall REST API,
/// rate-limited to stay within Scryfall's politeness guidelines.
#[derive(Parser, Debug)]
#[command(name = "scryfall-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries MCP messages only.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the scryfall-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration (defaults apply when no file exists)
    let cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %cfg.api.base_url,
        min_delay_ms = cfg.api.min_delay_ms,
        "Starting scryfall-mcp server"
    );

    let client = match ScryfallClient::new(&cfg.api) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to construct API client");
            return ExitCode::FAILURE;
        }
    };

    let mut server = McpServer::new(client);

    info!("MCP server ready, waiting for client connection...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(get_log_level(3, true, "info"), Level::ERROR);
    }

    #[test]
    fn config_level_applies_without_flags() {
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "unknown"), Level::WARN);
    }

    #[test]
    fn verbosity_flags_escalate() {
        assert_eq!(get_log_level(1, false, "warn"), Level::INFO);
        assert_eq!(get_log_level(2, false, "warn"), Level::DEBUG);
        assert_eq!(get_log_level(5, false, "warn"), Level::TRACE);
    }
}
