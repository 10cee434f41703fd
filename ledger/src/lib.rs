// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Governance Token Ledger
//!
//! A fungible token with the bookkeeping on-chain governance needs:
//! balances, fee-charging transfers, allowances, an append-only history,
//! and per-account voting-power checkpoints that can be queried at any
//! point in the past.
//!
//! ## Architecture
//!
//! - **types**: accounts, 256-bit amounts, operations and log records.
//! - **balance**: who holds what.
//! - **allowance**: who may spend whose tokens.
//! - **txlog**: the append-only transaction history.
//! - **checkpoint**: voting power over time, with binary-search lookups.
//! - **delegation**: delegation edges; the only writer of checkpoints.
//! - **ledger**: [`TokenLedger`], the service that ties it all together.
//! - **snapshot**: sorted export and validated restore.
//! - **shared**: a lock-protected handle for multi-threaded hosts.
//! - **clock**, **config**, **error**: the seams and the plumbing.
//!
//! ## Guarantees
//!
//! 1. Every operation is all-or-nothing: rejected calls change nothing and
//!    log nothing.
//! 2. Balances always add up to the total supply.
//! 3. The history is append-only and record `i` has index `i`.

pub mod allowance;
pub mod balance;
pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod delegation;
pub mod error;
pub mod ledger;
pub mod shared;
pub mod snapshot;
pub mod txlog;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TokenConfig;
pub use error::{ConfigError, InvariantViolation, LedgerError, LedgerResult, SnapshotError, TxError};
pub use ledger::{TokenInfo, TokenLedger, TokenMetadata, TokenStats};
pub use shared::SharedLedger;
pub use snapshot::LedgerSnapshot;
pub use types::{AccountId, Amount, Operation, Timestamp, TxIndex, TxRecord, TxStatus};
