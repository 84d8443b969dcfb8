//! # CLI Interface
//!
//! Defines the command-line argument structure for `assetledger-node` using
//! `clap` derive. Supports four subcommands: `init`, `invoke`, `run`, and
//! `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_DATA_DIR;

/// Asset ledger host.
///
/// Runs ledger invocations against a persistent world state, one
/// transaction at a time, and reports each result as a JSON line.
#[derive(Parser, Debug)]
#[command(
    name = "assetledger-node",
    about = "Asset issuance and redemption ledger host",
    version,
    propagate_version = true
)]
pub struct AssetLedgerCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and write a default `config.toml`.
    Init(InitArgs),
    /// Run a single invocation as one transaction and print the result.
    Invoke(InvokeArgs),
    /// Execute newline-delimited JSON invocations from a file or stdin.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Options shared by every subcommand that opens the ledger.
#[derive(Args, Debug, Clone, Default)]
pub struct NodeArgs {
    /// Path to the node configuration file (TOML).
    ///
    /// When omitted, `config.toml` in the data directory is used if present.
    #[arg(long, short = 'c', env = "ASSETLEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory holding the world state. Overrides the config file.
    #[arg(long, short = 'd', env = "ASSETLEDGER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log format: `pretty` or `json`. Overrides the config file.
    #[arg(long, env = "ASSETLEDGER_LOG_FORMAT")]
    pub log_format: Option<String>,
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "ASSETLEDGER_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Overwrite an existing `config.toml`.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `invoke` subcommand.
#[derive(Args, Debug)]
pub struct InvokeArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    /// Contract function, e.g. `SubscribeAsset`.
    pub function: String,

    /// Positional string arguments for the function.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    /// File of newline-delimited JSON invocations. Reads stdin when omitted.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Write Prometheus metrics in text format here once the input is drained.
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,
}
