use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use logger_redacted::{init_tracing, LoggerConfig};
use mydesk_server::{create_app, DeskServer, ServerConfig};
use std::path::PathBuf;
use tracing::info;

/// My Desk record server
#[derive(Parser, Debug)]
#[command(name = "mydesk-server")]
#[command(about = "Registers, attendance, tasks, profile and offices over HTTP")]
struct Args {
    /// Server bind address (overrides MYDESK_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Data directory (overrides MYDESK_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut logger = LoggerConfig::from_env();
    if args.verbose {
        logger = logger.with_level("debug");
    }
    init_tracing(&logger)?;

    let mut config = ServerConfig::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    info!("{}", "Starting My Desk server".bright_cyan());
    info!("Version: {}", env!("CARGO_PKG_VERSION").bright_white());
    info!("Data dir: {}", config.data_dir.display());
    info!("Inward dir: {}", config.inward_dir().display());
    info!("Outward dir: {}", config.outward_dir().display());
    if let Some(legacy) = &config.legacy_base_dir {
        info!("Legacy import from: {}", legacy.display());
    }
    if config.cleanup_legacy {
        info!("Legacy cleanup: enabled (MYDESK_CLEANUP_LEGACY=1)");
    }

    let addr = config.bind_address();
    let server = DeskServer::new(config).await?;
    let app = create_app(server);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("{}", format!("My Desk server running on http://{addr}").bright_green());
    info!("{}", format!("Health check available at: http://{addr}/health").bright_blue());

    axum::serve(listener, app).await.context("HTTP server error")?;
    Ok(())
}
