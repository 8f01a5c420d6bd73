use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{error, info};
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use unhcr_core::{DemographicsClient, ServerConfig};
use unhcr_mcp::{serve, DemographicsServer, LineTransport, ServeOutcome, WebSocketTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportKind {
    /// Newline-delimited JSON on stdin/stdout
    Stdio,
    /// JSON text frames over a WebSocket connection to `--url`
    Socket,
}

/// MCP server for UNHCR refugee demographics
#[derive(Parser, Debug)]
#[command(name = "unhcr-demographics-mcp", version, about)]
struct Cli {
    /// Transport to serve on
    #[arg(short, long, value_enum, default_value_t = TransportKind::Stdio)]
    transport: TransportKind,

    /// Path to a TOML config file (default: ~/.config/unhcr-demographics/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// WebSocket URL to connect to in socket mode
    #[arg(long)]
    url: Option<String>,

    /// Demographics endpoint override
    #[arg(long)]
    api_url: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable debug logging for this server
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Config layer from command-line flags
    fn overrides(&self) -> ServerConfig {
        ServerConfig {
            api_url: self.api_url.clone(),
            timeout_secs: self.timeout,
            socket_url: self.url.clone(),
            ..ServerConfig::empty()
        }
    }
}

fn init_logging(verbose: bool) {
    // stdout carries protocol lines, so all diagnostics go to stderr
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder
            .filter_module("unhcr_mcp", log::LevelFilter::Debug)
            .filter_module("unhcr_core", log::LevelFilter::Debug)
            .filter_module("unhcr_demographics_mcp", log::LevelFilter::Debug);
    }
    builder
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ServerConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .merge(&cli.overrides());

    let client = DemographicsClient::new(&config).context("Failed to build HTTP client")?;
    info!("Using demographics endpoint {}", client.api_url());
    let server = DemographicsServer::new(client, config.default_limit());

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutting down UNHCR Demographics MCP server...");
                signal_token.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    let outcome = match cli.transport {
        TransportKind::Stdio => {
            info!("UNHCR Demographics MCP server running on stdio");
            let mut transport = LineTransport::stdio();
            serve(&mut transport, &server, shutdown).await
        }
        TransportKind::Socket => {
            let url = config.socket_url().to_string();
            match WebSocketTransport::connect(&url, &shutdown)
                .await
                .with_context(|| format!("Failed to connect to {}", url))?
            {
                Some(mut transport) => {
                    info!("UNHCR Demographics MCP server connected to {}", url);
                    serve(&mut transport, &server, shutdown).await
                }
                None => Ok(ServeOutcome::Interrupted),
            }
        }
    }
    .context("Transport failed")?;

    match outcome {
        ServeOutcome::Interrupted => {
            // The stdin reader thread cannot be cancelled; exit without waiting for it.
            std::process::exit(0);
        }
        ServeOutcome::Closed => {
            info!("Transport closed, exiting");
            Ok(())
        }
    }
}
