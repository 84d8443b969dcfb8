// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Asset Ledger Node
//!
//! Entry point for the `assetledger-node` binary. Parses CLI arguments,
//! resolves configuration, initializes logging and metrics, opens the sled
//! world state, and feeds invocations through the single-writer executor.
//!
//! The binary supports four subcommands:
//!
//! - `init`   : create the data directory and a default `config.toml`
//! - `invoke` : run one invocation as one transaction
//! - `run`    : execute a newline-delimited JSON stream of invocations
//! - `version`: print build version information

mod batch;
mod cli;
mod config;
mod executor;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;

use assetledger_contracts::Invocation;
use assetledger_protocol::LedgerDB;

use batch::ResultLine;
use cli::{AssetLedgerCli, Commands, NodeArgs};
use config::{NodeConfig, CONFIG_FILE_NAME};
use executor::Executor;
use logging::LogFormat;
use metrics::NodeMetrics;

fn main() -> Result<()> {
    let cli = AssetLedgerCli::parse();

    match cli.command {
        Commands::Init(args) => init_node(args),
        Commands::Invoke(args) => invoke_once(args),
        Commands::Run(args) => run_stream(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Resolves configuration and initializes logging from it.
fn load_config(args: &NodeArgs) -> Result<NodeConfig> {
    let config = NodeConfig::resolve(
        args.config.as_deref(),
        args.data_dir.as_deref(),
        args.log_format.as_deref(),
    )?;
    logging::init_logging(&config.log_level, LogFormat::from_str_lossy(&config.log_format));
    Ok(config)
}

/// Opens the world state and wraps it in an executor.
fn open_executor(config: &NodeConfig) -> Result<Executor> {
    let db_path = config.db_path();
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let db = LedgerDB::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?
        .with_flush_on_commit(config.flush_on_commit);
    let last_tx_id = db.last_tx_id()?;
    tracing::info!(
        path = %db_path.display(),
        records = db.record_count(),
        last_tx_id = last_tx_id.as_deref().unwrap_or("-"),
        "database opened"
    );

    let metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);
    Ok(Executor::new(db, metrics))
}

/// Creates the data directory and writes a default config file into it.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let config_path = data_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            config_path.display()
        );
    }

    let config = NodeConfig {
        data_dir: data_dir.clone(),
        ..NodeConfig::default()
    };
    std::fs::write(&config_path, config.to_toml()?)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    tracing::info!(config = %config_path.display(), "node initialized");

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Config file    : {}", config_path.display());

    Ok(())
}

/// Runs a single invocation and prints its result line.
///
/// Exits non-zero when the invocation did not commit.
fn invoke_once(args: cli::InvokeArgs) -> Result<()> {
    let config = load_config(&args.node)?;
    let executor = open_executor(&config)?;

    let result = Invocation::parse(&args.function, &args.args)
        .and_then(|invocation| executor.execute(&invocation));
    let line = ResultLine::from_result(&args.function, &result);
    println!("{}", serde_json::to_string(&line)?);

    result
        .map(|_| ())
        .with_context(|| format!("{} did not commit", args.function))
}

/// Drains a newline-delimited JSON stream through the executor.
fn run_stream(args: cli::RunArgs) -> Result<()> {
    let config = load_config(&args.node)?;
    let executor = open_executor(&config)?;
    let stdout = io::stdout().lock();

    let summary = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open input {}", path.display()))?;
            batch::process(&executor, BufReader::new(file), stdout)?
        }
        None => batch::process(&executor, io::stdin().lock(), stdout)?,
    };

    if let Some(path) = &args.metrics_out {
        let text = executor.metrics().encode().context("failed to encode metrics")?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    }

    tracing::info!(
        committed = summary.committed,
        failed = summary.failed,
        "assetledger-node finished"
    );
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("assetledger-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol         {}", assetledger_protocol::config::PROTOCOL_VERSION);
}
