//! Ledger node binary
//!
//! `ledger-node` with no arguments opens the ledger and runs until Ctrl-C.
//! `ledger-node <function> [args...]` runs one function and prints its reply,
//! e.g. `ledger-node transfer alice bob points 200`.
//!
//! Configuration comes from the TOML file named by `LEDGER_CONFIG`, otherwise
//! from `LEDGER_*` environment variables.

use anyhow::Context;
use asset_ledger::{Config, Ledger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; logs go to stderr so replies own stdout
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    if std::env::var("LEDGER_LOG_JSON").is_ok() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    // Load configuration
    let config = match std::env::var("LEDGER_CONFIG") {
        Ok(path) => Config::from_file(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        Err(_) => Config::from_env().context("loading configuration from environment")?,
    };

    tracing::info!(data_dir = ?config.data_dir, "Starting ledger node");
    let ledger = Ledger::open(config).await.context("opening ledger")?;

    let mut argv = std::env::args().skip(1);
    match argv.next() {
        Some(function) => {
            let args: Vec<String> = argv.collect();
            let outcome = ledger.dispatch(&function, &args).await;
            ledger.shutdown().await?;
            let reply = outcome.with_context(|| format!("{} failed", function))?;
            println!("{}", reply);
        }
        None => {
            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutting down ledger node");
            ledger.shutdown().await?;
        }
    }

    Ok(())
}
