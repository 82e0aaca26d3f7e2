//! mcp-demo-client: demo MCP server integration
//!
//! Connects to an MCP server, lists its resources and capabilities, and runs
//! the word counter tool on user input text.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use mcp_demo_client::app;
use mcp_demo_client::config::{self, AUTH_TOKEN_ENV, SERVER_URL_ENV};
use mcp_demo_client::session::{ConnectionConfig, RemoteSession};

/// How long to wait for a pending stdin read when shutting the runtime down.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(250);

/// Demo MCP server integration.
///
/// Connects to an MCP server, lists resources and capabilities, and runs the
/// word counter tool on some text (counted locally if the tool is missing).
#[derive(Parser, Debug)]
#[command(name = "mcp-demo-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// MCP server WebSocket endpoint
    #[arg(long, env = SERVER_URL_ENV, value_name = "URL")]
    server_url: Option<String>,

    /// Authentication token
    #[arg(long, env = AUTH_TOKEN_ENV, hide_env_values = true, value_name = "TOKEN")]
    auth_token: Option<String>,

    /// Text to run word counter tool on (prompted for if omitted)
    #[arg(long)]
    text: Option<String>,

    /// Path to configuration file
    #[arg(long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Timeout in seconds for connecting and for each request
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Additional connection attempts after a timed-out or refused one
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Extra header for the WebSocket handshake (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Parses a `NAME=VALUE` header argument.
fn parse_header(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{arg}'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err("header name must not be empty".to_string());
    }

    Ok((name.to_string(), value.trim().to_string()))
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
/// Logs go to stderr so they never mix with the walkthrough output.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves once the user asks the process to stop.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigint), Ok(mut sigterm)) = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) else {
        warn!("Could not install signal handlers");
        return std::future::pending().await;
    };

    tokio::select! {
        _ = sigint.recv() => info!("Received SIGINT, disconnecting"),
        _ = sigterm.recv() => info!("Received SIGTERM, disconnecting"),
    }
}

/// Resolves once the user asks the process to stop.
#[cfg(windows)]
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, disconnecting");
    } else {
        warn!("Could not install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

/// Entry point for the mcp-demo-client.
fn main() -> ExitCode {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    let Some(server_url) = config::resolve_server_url(args.server_url, &cfg) else {
        println!(
            "Error: MCP server URL must be specified via --server-url or {SERVER_URL_ENV} env variable."
        );
        return ExitCode::FAILURE;
    };

    let connection = ConnectionConfig::new(server_url)
        .with_auth_token(args.auth_token.filter(|token| !token.is_empty()))
        .with_headers(cfg.connection.headers.clone())
        .with_headers(args.headers)
        .with_timeout(
            args.timeout
                .map_or_else(|| cfg.connection.timeout(), Duration::from_secs),
        )
        .with_retry_attempts(args.retries.unwrap_or(cfg.connection.retry_attempts));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %connection.endpoint(),
        timeout_secs = connection.timeout().as_secs(),
        retry_attempts = connection.retry_attempts(),
        "Starting mcp-demo-client"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let mut session = RemoteSession::new(connection);
    let mut input = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    runtime.block_on(app::run(
        &mut session,
        args.text,
        &mut input,
        &mut out,
        shutdown_signal(),
    ));

    // A prompt read may still be parked on stdin after an interrupt.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    ExitCode::SUCCESS
}
