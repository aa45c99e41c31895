use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use logger_redacted::{init_tracing, LoggerConfig};
use mydesk_sync::{
    Collection, FileLocalStore, HttpRemoteStore, LocalStore, MigrationFlag,
    OfficeChangeDetection, Reconciler, SnapshotLocalStore, SyncConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Push local My Desk data to the record server
#[derive(Parser, Debug)]
#[command(name = "mydesk-migrate")]
#[command(about = "Reconcile a My Desk local store with the record server")]
struct Args {
    /// Record server base URL
    #[arg(long, env = "MYDESK_SERVER_URL", default_value = "http://localhost:4000")]
    server: String,

    /// Bearer token for the record server
    #[arg(long, env = "MYDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log in with this username instead of passing a token
    #[arg(long, env = "MYDESK_USERNAME", requires = "password")]
    username: Option<String>,

    #[arg(long, env = "MYDESK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Local export JSON file (never marked as migrated)
    #[arg(long, conflicts_with = "local_dir")]
    export: Option<PathBuf>,

    /// Directory-backed local store (one `<key>.json` per key)
    #[arg(long)]
    local_dir: Option<PathBuf>,

    /// Run even when the local store is already marked as migrated
    #[arg(long)]
    force: bool,

    /// Push the merged office list whenever it differs from the server's
    #[arg(long)]
    full_office_compare: bool,

    /// Request timeout in seconds
    #[arg(long, env = "MYDESK_HTTP_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Enable debug logging
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

    let local: Arc<dyn LocalStore> = match (&args.export, &args.local_dir) {
        (Some(path), _) => Arc::new(
            SnapshotLocalStore::from_export_file(path)
                .with_context(|| format!("Failed to load export {}", path.display()))?,
        ),
        (None, Some(dir)) => Arc::new(
            FileLocalStore::open(dir)
                .with_context(|| format!("Failed to open local store {}", dir.display()))?,
        ),
        (None, None) => bail!("Either --export or --local-dir is required"),
    };

    let config = SyncConfig {
        server_url: args.server.clone(),
        auth_token: args.token.clone(),
        timeout_secs: args.timeout_secs,
        office_detection: if args.full_office_compare {
            OfficeChangeDetection::FullEquality
        } else {
            OfficeChangeDetection::LengthOnly
        },
    };

    let mut remote = HttpRemoteStore::new(&config)?;
    if let (Some(username), Some(password)) = (&args.username, &args.password) {
        let token = remote
            .login(username, password)
            .await
            .context("Login failed")?;
        remote = remote.with_token(token);
    }
    if remote.token().is_none() {
        bail!("A token (--token / MYDESK_TOKEN) or --username/--password is required");
    }

    info!("Migrating local data to {}", config.server_url);
    let reconciler = Reconciler::from_config(local.clone(), Arc::new(remote), &config);

    let outcome = if args.force {
        let outcome = reconciler.run(MigrationFlag::PENDING).await;
        outcome.flag.store(local.as_ref());
        outcome
    } else {
        reconciler.run_persisted().await
    };

    let Some(report) = outcome.report else {
        println!("{}", "Local data already migrated, nothing to do (use --force to rerun)".yellow());
        return Ok(());
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    for collection in Collection::ALL {
        let result = report.outcome(collection);
        let line = format!(
            "{:<10} created {:>3}  updated {:>3}  skipped {:>3}  failed {:>3}",
            collection.as_str(),
            result.created,
            result.updated,
            result.skipped,
            result.failed
        );
        if result.is_clean() {
            eprintln!("{}", line.green());
        } else {
            eprintln!("{}", line.red());
        }
    }

    Ok(())
}
