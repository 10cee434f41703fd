//! # CLI Interface
//!
//! Defines the command-line argument structure for `govtoken-node` using
//! `clap` derive. Subcommands: `init`, `apply`, `info`, `query` and
//! `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use govtoken_ledger::config::DEFAULT_PAGE_LIMIT;

use crate::logging::LogFormat;

/// Governance token ledger host.
///
/// Creates ledgers from a TOML config, replays JSON operation batches
/// against snapshot files, and answers read-only queries.
#[derive(Parser, Debug)]
#[command(
    name = "govtoken-node",
    about = "Governance token ledger host",
    version,
    propagate_version = true
)]
pub struct GovtokenCli {
    /// Log filter used when `RUST_LOG` is unset. Overrides the config file.
    #[arg(long, global = true, env = "GOVTOKEN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format. Overrides the config file.
    #[arg(long, global = true, value_enum, env = "GOVTOKEN_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a ledger from a token config and write its snapshot.
    Init(InitArgs),
    /// Apply a JSON batch of operations to a snapshot.
    Apply(ApplyArgs),
    /// Print token metadata and status as JSON.
    Info(InfoArgs),
    /// Run a read-only query against a snapshot.
    Query(QueryArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Node configuration file (TOML) with a `[token]` table.
    #[arg(long, short = 'c', env = "GOVTOKEN_CONFIG")]
    pub config: PathBuf,

    /// Where to write the new snapshot.
    #[arg(long, short = 'o')]
    pub out: PathBuf,

    /// Overwrite `out` if it already exists.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `apply` subcommand.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Snapshot to load.
    #[arg(long, short = 's', env = "GOVTOKEN_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// JSON array of operations.
    #[arg(long)]
    pub ops: PathBuf,

    /// Where to write the updated snapshot. Defaults to `--snapshot`.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Stamp every operation with this time (nanoseconds since the epoch)
    /// instead of the wall clock, for reproducible replays.
    #[arg(long)]
    pub timestamp: Option<u64>,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Snapshot to read.
    #[arg(long, short = 's', env = "GOVTOKEN_SNAPSHOT")]
    pub snapshot: PathBuf,
}

/// Arguments for the `query` subcommand.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Snapshot to read.
    #[arg(long, short = 's', env = "GOVTOKEN_SNAPSHOT")]
    pub snapshot: PathBuf,

    #[command(subcommand)]
    pub query: Query,
}

/// Read-only queries.
#[derive(Subcommand, Debug)]
pub enum Query {
    /// Balance of an account.
    Balance { account: String },
    /// Remaining allowance of `spender` over `owner`'s tokens.
    Allowance { owner: String, spender: String },
    /// Current voting power and delegate of an account.
    Votes { account: String },
    /// Voting power of an account at a past time (nanoseconds).
    PriorVotes { account: String, timestamp: u64 },
    /// Transaction history, optionally filtered to one account.
    History {
        #[arg(long)]
        account: Option<String>,
        #[arg(long, default_value_t = 0)]
        start: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: usize,
    },
    /// Holders by descending balance.
    Holders {
        #[arg(long, default_value_t = 0)]
        start: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: usize,
    },
    /// Every approval granted by `owner`.
    Approvals { owner: String },
}
