//! Curio CLI
//!
//! `curio serve` runs the course API; `curio learn` is a terminal client for it.

mod learn;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use curio_course::{DifficultyLevel, DEFAULT_CANVAS_WIDTH};
use curio_gateway::ProxyClient;
use curio_server::{create_router, AppState, Config};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default server URL for the learn client.
const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";

/// Default client-side request timeout in seconds.
const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 120;

/// Curio - AI-generated interactive courses
///
/// Turns any topic into concepts, a flowchart and a quiz, and suggests where
/// to go next when you ace it.
#[derive(Parser, Debug)]
#[command(name = "curio")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API that generates courses
    Serve(ServeArgs),
    /// Learn a topic interactively in the terminal
    Learn(LearnArgs),
}

#[derive(ClapArgs, Debug)]
struct ServeArgs {
    /// Path to configuration file (default: curio.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Port for the HTTP API server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,
}

/// Options for the terminal learner.
#[derive(ClapArgs, Debug)]
pub struct LearnArgs {
    /// Topic to learn (prompted for when omitted)
    #[arg(value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Base URL of a running `curio serve`
    #[arg(short, long, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Audience: child, teenager, undergrad or professional
    #[arg(short, long, default_value = "undergrad")]
    pub difficulty: DifficultyLevel,

    /// Width of the canvas the flowchart is laid out on
    #[arg(long, default_value_t = DEFAULT_CANVAS_WIDTH)]
    pub canvas_width: f64,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CLIENT_TIMEOUT_SECS)]
    pub timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Command::Serve(serve_args) => run_server(serve_args).await,
        Command::Learn(learn_args) => learn_session(learn_args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads config, binds the listener and serves until Ctrl+C.
async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(ref bind) = args.bind {
        config.bind_address.clone_from(bind);
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let listen = config.listen_address();
    let state = AppState::from_config(config)?;
    let router = create_router(state);

    let listener = TcpListener::bind(&listen).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {listen}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    tracing::info!(address = %listen, "Curio server listening");
    println!("Curio API running on http://{listen}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        })
        .await?;

    Ok(())
}

/// Connects to a server and runs the interactive learner.
async fn learn_session(args: LearnArgs) -> anyhow::Result<()> {
    if !(args.canvas_width.is_finite() && args.canvas_width > 0.0) {
        anyhow::bail!(
            "--canvas-width must be a positive number, got {}",
            args.canvas_width
        );
    }

    let client = ProxyClient::new(&args.server, Duration::from_secs(args.timeout))?;
    tracing::debug!(server = %client.base_url(), "Using Curio server");

    learn::run(&client, args).await
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Listen address: {}", config.listen_address());
    println!("  Upstream: {}", config.upstream.api_url);
    println!("  Model: {}", config.upstream.model);
    println!("  API key variable: {}", config.upstream.api_key_env);
    println!("  Timeout: {}s", config.upstream.timeout_secs);
}
