// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Governance Token Node
//!
//! Entry point for the `govtoken-node` binary. Parses CLI arguments,
//! initializes logging, and drives a [`TokenLedger`] stored in a snapshot
//! file.
//!
//! The binary supports five subcommands:
//!
//! - `init`   : build a ledger from a TOML config and write its snapshot
//! - `apply`  : replay a JSON batch of operations against a snapshot
//! - `info`   : print token metadata and status
//! - `query`  : read-only queries (balances, votes, history, ...)
//! - `version`: print build version information
//!
//! Results go to stdout as JSON; logs go to stderr.

mod cli;
mod config;
mod logging;
mod ops;
mod storage;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use serde_json::json;

use govtoken_ledger::{AccountId, Clock, ManualClock, SystemClock, TokenLedger};

use cli::{Commands, GovtokenCli, Query};
use config::{LoggingConfig, NodeConfig};

fn main() -> Result<()> {
    let cli = GovtokenCli::parse();

    match cli.command {
        Commands::Init(args) => {
            let node_config = NodeConfig::load(&args.config)?;
            init_logging(cli.log_level.as_deref(), cli.log_format, &node_config.logging);
            init_ledger(node_config, &args.out, args.force)
        }
        Commands::Apply(args) => {
            init_logging(cli.log_level.as_deref(), cli.log_format, &LoggingConfig::default());
            apply_ops(args)
        }
        Commands::Info(args) => {
            init_logging(cli.log_level.as_deref(), cli.log_format, &LoggingConfig::default());
            print_info(&args.snapshot)
        }
        Commands::Query(args) => {
            init_logging(cli.log_level.as_deref(), cli.log_format, &LoggingConfig::default());
            run_query(&args.snapshot, args.query)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// CLI flags win over the config file's `[logging]` table.
fn init_logging(level: Option<&str>, format: Option<logging::LogFormat>, defaults: &LoggingConfig) {
    let level = level.unwrap_or(&defaults.level);
    let format = format.unwrap_or_else(|| defaults.log_format());
    logging::init_logging(level, format);
}

fn init_ledger(node_config: NodeConfig, out: &Path, force: bool) -> Result<()> {
    let ledger = TokenLedger::new(node_config.token, Arc::new(SystemClock))
        .context("invalid token configuration")?;
    storage::write_ledger(out, &ledger, force)?;
    print_json(&ledger.token_info())
}

fn apply_ops(args: cli::ApplyArgs) -> Result<()> {
    let clock: Arc<dyn Clock> = match args.timestamp {
        Some(t) => Arc::new(ManualClock::new(t)),
        None => Arc::new(SystemClock),
    };
    let mut ledger = storage::load_ledger(&args.snapshot, clock)?;
    let requests = ops::read_batch(&args.ops)?;
    tracing::info!(count = requests.len(), snapshot = %args.snapshot.display(), "applying batch");

    let report = ops::apply_batch(&mut ledger, &requests);
    print_json(&report)?;

    if let Some(fault) = &report.fatal {
        bail!("batch aborted by fatal ledger fault, snapshot not written: {fault}");
    }
    let out = args.out.as_deref().unwrap_or(&args.snapshot);
    storage::write_ledger(out, &ledger, true)?;
    tracing::info!(applied = report.applied, rejected = report.rejected, "batch complete");
    Ok(())
}

fn print_info(snapshot: &Path) -> Result<()> {
    let ledger = storage::load_ledger(snapshot, Arc::new(SystemClock))?;
    let info = ledger.token_info();
    print_json(&json!({
        "info": info,
        "deployed_at": render_time(info.deploy_time),
    }))
}

fn run_query(snapshot: &Path, query: Query) -> Result<()> {
    let ledger = storage::load_ledger(snapshot, Arc::new(SystemClock))?;
    match query {
        Query::Balance { account: a } => {
            let a = AccountId::from(a);
            print_json(&json!({ "account": a, "balance": ledger.balance_of(&a) }))
        }
        Query::Allowance { owner, spender } => {
            let (owner, spender) = (AccountId::from(owner), AccountId::from(spender));
            print_json(&json!({
                "owner": owner,
                "spender": spender,
                "allowance": ledger.allowance(&owner, &spender),
            }))
        }
        Query::Votes { account: a } => {
            let a = AccountId::from(a);
            print_json(&json!({
                "account": a,
                "votes": ledger.get_current_votes(&a),
                "delegate": ledger.get_delegate(&a),
                "checkpoints": ledger.get_checkpoints(&a),
            }))
        }
        Query::PriorVotes { account: a, timestamp } => {
            let a = AccountId::from(a);
            print_json(&json!({
                "account": a,
                "timestamp": timestamp,
                "at": render_time(timestamp),
                "votes": ledger.get_prior_votes(&a, timestamp),
            }))
        }
        Query::History { account: None, start, limit } => print_json(&json!({
            "total": ledger.history_size(),
            "transactions": ledger.get_transactions(start, limit),
        })),
        Query::History { account: Some(a), start, limit } => {
            let a = AccountId::from(a);
            print_json(&json!({
                "account": a,
                "total": ledger.get_user_transaction_amount(&a),
                "transactions": ledger.get_user_transactions(&a, start, limit),
            }))
        }
        Query::Holders { start, limit } => print_json(&json!({
            "total": ledger.token_info().holder_count,
            "holders": ledger.get_holders(start, limit),
        })),
        Query::Approvals { owner } => {
            let owner = AccountId::from(owner);
            print_json(&json!({
                "owner": owner,
                "approvals": ledger.get_user_approvals(&owner),
            }))
        }
    }
}

/// Renders a nanosecond timestamp as RFC 3339.
fn render_time(nanos: u64) -> String {
    let secs = (nanos / 1_000_000_000) as i64;
    let sub = (nanos % 1_000_000_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, sub)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| nanos.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn print_version() {
    println!("govtoken-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
