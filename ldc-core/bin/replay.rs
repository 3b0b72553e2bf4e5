// bin/replay.rs - Apply a batch of transactions to an account snapshot
use anyhow::{Context, Result};
use clap::Parser;
use ldc_core::{snapshot, LedgerConfig, LedgerEngine, ReplayDocument};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ldc-replay")]
#[command(about = "Replay LDC ledger transactions against an account snapshot", long_about = None)]
struct Args {
    /// Ledger config file (.toml, .yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON document with "accounts" and "transactions"
    #[arg(short, long)]
    input: PathBuf,

    /// Log level, overrides the config
    #[arg(short, long)]
    log_level: Option<String>,

    /// Pretty-print the final snapshot
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    let log_level = args.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let doc = ReplayDocument::load(&args.input)
        .with_context(|| format!("Failed to read replay input {}", args.input.display()))?;

    tracing::info!("Starting replay");
    tracing::info!("  Chain id: {}", config.chain_id);
    tracing::info!("  Gas price: {}", config.gas_price);
    tracing::info!("  Accounts: {}", doc.accounts.len());
    tracing::info!("  Transactions: {}", doc.transactions.len());

    let state = doc.genesis()?;
    let mut engine = LedgerEngine::from_config(&config, state)?;

    for (index, tx) in doc.transactions.into_iter().enumerate() {
        let outcome = match engine.apply(tx) {
            Ok(receipt) => json!({ "index": index, "ok": true, "receipt": receipt }),
            Err(err) => json!({
                "index": index,
                "ok": false,
                "kind": format!("{:?}", err.kind()),
                "error": err.to_string(),
            }),
        };
        println!("{}", outcome);
    }

    let stats = engine.stats();
    tracing::info!(applied = stats.applied, rejected = stats.rejected, "Replay finished");

    let accounts = snapshot::export(engine.state())?;
    let output = json!({ "stats": stats, "accounts": accounts });
    if args.pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", output);
    }
    Ok(())
}
