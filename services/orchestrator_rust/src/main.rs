mod config;
mod managers;

use crate::config::Config;
use crate::managers::run_manager::RunManager;
use anyhow::Result;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// RUST_LOG wins over LOG_LEVEL.
fn init_logging(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Log a fatal error before it ends the process.
fn log_failure<T>(stage: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        error!("{}, exiting: {:#}", stage, e);
    }
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Config; logging comes up even when it is invalid so the error is recorded
    let config = Config::from_env();
    init_logging(config.as_ref().map(|c| c.log_level.as_str()).unwrap_or("info"));
    let config = log_failure("Config error", config)?;

    info!("Starting M3U sports orchestrator...");

    let report = log_failure("Run failed", RunManager::new(config).run().await)?;

    info!(
        "Run {} complete: {} listings, {} games, {} lineups, diagnostics in {}",
        report.run_id,
        report.listings,
        report.games,
        report.lineups,
        report.diagnostics_dir.display()
    );

    Ok(())
}
