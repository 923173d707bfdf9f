//! Custodia daemon — entry point for running the ledger API server.

mod config;
mod logging;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use custodia_catalog::CurrencyCatalog;
use custodia_ledger::Ledger;
use custodia_rpc::RpcServer;
use custodia_store::user::{UserRecord, UserStore};
use custodia_store_lmdb::LmdbEnvironment;
use custodia_types::UserId;

use config::DaemonConfig;
use logging::LogFormat;

#[derive(Parser)]
#[command(name = "custodia-daemon", about = "Custodia ledger daemon")]
struct Cli {
    /// Data directory for ledger storage.
    #[arg(long, env = "CUSTODIA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address for the API server.
    #[arg(long, env = "CUSTODIA_LISTEN_ADDR")]
    listen_addr: Option<SocketAddr>,

    /// LMDB map size in megabytes.
    #[arg(long, env = "CUSTODIA_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Writer wait bound in milliseconds before a busy error.
    #[arg(long, env = "CUSTODIA_WRITE_TIMEOUT_MS")]
    write_timeout_ms: Option<u64>,

    /// Path to a TOML currency catalog (defaults to the built-in table).
    #[arg(long, env = "CUSTODIA_CURRENCIES")]
    currencies: Option<PathBuf>,

    /// Create demo users on startup.
    #[arg(long, env = "CUSTODIA_SEED_DEMO_USERS")]
    seed_demo_users: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "CUSTODIA_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CUSTODIA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the ledger API server.
    Run,
}

/// How many users `--seed-demo-users` creates (ids 1..=N).
const DEMO_USER_COUNT: u64 = 3;

fn merge_config(cli: &Cli, base: DaemonConfig) -> DaemonConfig {
    DaemonConfig {
        data_dir: cli.data_dir.clone().unwrap_or(base.data_dir),
        listen_addr: cli.listen_addr.unwrap_or(base.listen_addr),
        map_size_mb: cli.map_size_mb.unwrap_or(base.map_size_mb),
        write_timeout_ms: cli.write_timeout_ms.unwrap_or(base.write_timeout_ms),
        currencies_file: cli.currencies.clone().or(base.currencies_file),
        seed_demo_users: cli.seed_demo_users || base.seed_demo_users,
        log_format: cli.log_format.clone().unwrap_or(base.log_format),
        log_level: cli.log_level.clone().unwrap_or(base.log_level),
    }
}

fn load_catalog(config: &DaemonConfig) -> anyhow::Result<CurrencyCatalog> {
    match &config.currencies_file {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read currency catalog {}", path.display()))?;
            let catalog = CurrencyCatalog::from_toml_str(&contents)
                .with_context(|| format!("failed to parse currency catalog {}", path.display()))?;
            tracing::info!(path = %path.display(), currencies = catalog.len(), "loaded currency catalog");
            Ok(catalog)
        }
        None => Ok(CurrencyCatalog::builtin()),
    }
}

fn seed_demo_users(store: &LmdbEnvironment) -> anyhow::Result<()> {
    for id in 1..=DEMO_USER_COUNT {
        let user_id = UserId::new(id);
        if !store.user_exists(user_id)? {
            store.put_user(&UserRecord::new(user_id))?;
            tracing::info!(%user_id, "seeded demo user");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    let config = merge_config(&cli, base);

    logging::init_logging(LogFormat::parse(&config.log_format), &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config file");
    }

    match cli.command {
        Command::Run => {
            let catalog = load_catalog(&config)?;
            let env = LmdbEnvironment::open(
                &config.data_dir,
                config.map_size_mb * 1024 * 1024,
                Duration::from_millis(config.write_timeout_ms),
            )
            .with_context(|| {
                format!("failed to open data directory {}", config.data_dir.display())
            })?;

            if config.seed_demo_users {
                seed_demo_users(&env)?;
            }

            let ledger = Arc::new(Ledger::new(env, catalog));
            tracing::info!(
                data_dir = %config.data_dir.display(),
                listen_addr = %config.listen_addr,
                "starting Custodia ledger daemon"
            );

            RpcServer::new(config.listen_addr, ledger)
                .serve(shutdown_signal())
                .await?;

            tracing::info!("Custodia daemon exited cleanly");
        }
    }

    Ok(())
}
