//! # Snapshots
//!
//! A [`LedgerSnapshot`] is the full ledger state as plain, sorted
//! sequences. Two ledgers with the same state export byte-identical
//! snapshots regardless of hash-map iteration order.
//!
//! Restoring validates everything live state guarantees (conservation, no
//! zero entries, ordered checkpoints, dense log indices) and refuses the
//! snapshot otherwise; a ledger is never rebuilt from state it could not
//! have reached on its own.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allowance::AllowanceTable;
use crate::balance::BalanceLedger;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::clock::Clock;
use crate::delegation::DelegationResolver;
use crate::error::SnapshotError;
use crate::ledger::{TokenLedger, TokenStats};
use crate::txlog::TxLog;
use crate::types::{AccountId, Amount, TxRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    pub owner: AccountId,
    pub spender: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationEntry {
    pub delegator: AccountId,
    pub delegatee: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointHistory {
    pub account: AccountId,
    pub checkpoints: Vec<Checkpoint>,
}

/// Exported ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub stats: TokenStats,
    /// Sorted by account.
    pub balances: Vec<BalanceEntry>,
    /// Sorted by owner, then spender.
    pub allowances: Vec<AllowanceEntry>,
    /// Sorted by delegator.
    pub delegations: Vec<DelegationEntry>,
    /// Sorted by account.
    pub checkpoints: Vec<CheckpointHistory>,
    /// The whole log, oldest first.
    pub transactions: Vec<TxRecord>,
}

impl LedgerSnapshot {
    /// Exports the state of `ledger`.
    pub fn capture(ledger: &TokenLedger) -> Self {
        let mut balances: Vec<BalanceEntry> = ledger
            .balances
            .iter()
            .map(|(account, amount)| BalanceEntry {
                account: account.clone(),
                amount: *amount,
            })
            .collect();
        balances.sort_by(|a, b| a.account.cmp(&b.account));

        let mut allowances: Vec<AllowanceEntry> = ledger
            .allowances
            .entries()
            .map(|(owner, spender, amount)| AllowanceEntry {
                owner: owner.clone(),
                spender: spender.clone(),
                amount: *amount,
            })
            .collect();
        allowances.sort_by(|a, b| a.owner.cmp(&b.owner).then_with(|| a.spender.cmp(&b.spender)));

        let mut delegations: Vec<DelegationEntry> = ledger
            .voting
            .edges()
            .map(|(delegator, delegatee)| DelegationEntry {
                delegator: delegator.clone(),
                delegatee: delegatee.clone(),
            })
            .collect();
        delegations.sort_by(|a, b| a.delegator.cmp(&b.delegator));

        let mut checkpoints: Vec<CheckpointHistory> = ledger
            .voting
            .checkpoints()
            .iter()
            .map(|(account, sequence)| CheckpointHistory {
                account: account.clone(),
                checkpoints: sequence.to_vec(),
            })
            .collect();
        checkpoints.sort_by(|a, b| a.account.cmp(&b.account));

        Self {
            stats: ledger.stats.clone(),
            balances,
            allowances,
            delegations,
            checkpoints,
            transactions: ledger.log.records().to_vec(),
        }
    }

    /// Rebuilds a ledger from this snapshot, reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the snapshot describes a state the
    /// ledger could never have reached.
    pub fn restore(self, clock: Arc<dyn Clock>) -> Result<TokenLedger, SnapshotError> {
        self.stats.validate()?;

        let mut balances = BalanceLedger::new();
        let mut sum = Amount::ZERO;
        for entry in self.balances {
            if entry.amount.is_zero() {
                return Err(SnapshotError::ZeroEntry {
                    kind: "balance",
                    account: entry.account,
                });
            }
            sum = sum.checked_add(entry.amount).ok_or(SnapshotError::Overflow)?;
            let key = entry.account.to_string();
            if !balances.insert_restored(entry.account, entry.amount) {
                return Err(SnapshotError::DuplicateEntry { kind: "balance", key });
            }
        }
        if sum != self.stats.total_supply {
            return Err(SnapshotError::SupplyMismatch {
                sum,
                total_supply: self.stats.total_supply,
            });
        }

        let mut allowances = AllowanceTable::new();
        let mut seen_pairs = HashSet::new();
        for entry in self.allowances {
            if entry.amount.is_zero() {
                return Err(SnapshotError::ZeroEntry {
                    kind: "allowance",
                    account: entry.owner,
                });
            }
            if !seen_pairs.insert((entry.owner.clone(), entry.spender.clone())) {
                return Err(SnapshotError::DuplicateEntry {
                    kind: "allowance",
                    key: format!("{} -> {}", entry.owner, entry.spender),
                });
            }
            allowances.set_allowance(&entry.owner, &entry.spender, entry.amount);
        }

        let mut delegates = HashMap::new();
        for entry in self.delegations {
            let key = entry.delegator.to_string();
            if delegates.insert(entry.delegator, entry.delegatee).is_some() {
                return Err(SnapshotError::DuplicateEntry { kind: "delegation", key });
            }
        }

        let mut store = CheckpointStore::new();
        for history in self.checkpoints {
            let ordered = history
                .checkpoints
                .windows(2)
                .all(|pair| pair[0].timestamp < pair[1].timestamp);
            if !ordered {
                return Err(SnapshotError::UnorderedCheckpoints {
                    account: history.account,
                });
            }
            let key = history.account.to_string();
            if !store.insert_restored(history.account, history.checkpoints) {
                return Err(SnapshotError::DuplicateEntry { kind: "checkpoint", key });
            }
        }

        for (position, record) in self.transactions.iter().enumerate() {
            if record.index != position {
                return Err(SnapshotError::MisindexedRecord {
                    position,
                    index: record.index,
                });
            }
        }
        let log = TxLog::from_records(self.transactions);

        info!(
            symbol = %self.stats.symbol,
            holders = balances.holder_count(),
            history_size = log.len(),
            "ledger restored from snapshot"
        );

        Ok(TokenLedger::from_parts(
            self.stats,
            balances,
            allowances,
            log,
            DelegationResolver::from_parts(delegates, store),
            clock,
        ))
    }

    /// Compact binary encoding for storage.
    pub fn to_bincode(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bincode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Pretty-printed JSON for inspection.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TokenLedger {
    /// Shorthand for [`LedgerSnapshot::capture`].
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::capture(self)
    }

    /// Shorthand for [`LedgerSnapshot::restore`].
    pub fn from_snapshot(snapshot: LedgerSnapshot, clock: Arc<dyn Clock>) -> Result<Self, SnapshotError> {
        snapshot.restore(clock)
    }
}
