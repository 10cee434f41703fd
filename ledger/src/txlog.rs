//! # Transaction Log
//!
//! Append-only history of every successful operation. A record's index is
//! its position, assigned at append time, and is what mutating operations
//! hand back as the receipt.
//!
//! Pagination uses unsigned, saturating arithmetic throughout: there are
//! no negative offsets and a start past the end simply yields nothing.

use serde::{Deserialize, Serialize};

use crate::error::TxError;
use crate::types::{AccountId, Amount, Operation, Timestamp, TxIndex, TxRecord, TxStatus};

/// Ordered, immutable sequence of [`TxRecord`]s.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TxLog {
    records: Vec<TxRecord>,
}

/// Everything a record needs except its index.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub caller: Option<AccountId>,
    pub operation: Operation,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
    pub fee: Amount,
    pub timestamp: Timestamp,
    pub status: TxStatus,
}

impl TxLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a record and returns its index.
    pub fn append(&mut self, record: NewRecord) -> TxIndex {
        let index = self.records.len();
        self.records.push(TxRecord {
            caller: record.caller,
            operation: record.operation,
            index,
            from: record.from,
            to: record.to,
            amount: record.amount,
            fee: record.fee,
            timestamp: record.timestamp,
            status: record.status,
        });
        index
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TxError::IndexOutOfRange`] if `index >= len()`.
    pub fn get(&self, index: TxIndex) -> Result<&TxRecord, TxError> {
        self.records.get(index).ok_or(TxError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    /// Records `[start, min(start + limit, len))`.
    pub fn range(&self, start: usize, limit: usize) -> &[TxRecord] {
        let len = self.records.len();
        if start >= len {
            return &[];
        }
        let end = start.saturating_add(limit).min(len);
        &self.records[start..end]
    }

    /// Records involving `account` as caller, source or destination, in log
    /// order. `start` and `limit` count matching records only.
    pub fn filter_by_participant(
        &self,
        account: &AccountId,
        start: usize,
        limit: usize,
    ) -> Vec<TxRecord> {
        self.records
            .iter()
            .filter(|r| r.involves(account))
            .skip(start)
            .take(limit)
            .cloned()
            .collect()
    }

    /// How many records involve `account`.
    pub fn count_by_participant(&self, account: &AccountId) -> usize {
        self.records.iter().filter(|r| r.involves(account)).count()
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[TxRecord] {
        &self.records
    }

    /// Rebuilds a log from exported records. Positions must already match
    /// indices; the snapshot layer checks that.
    pub(crate) fn from_records(records: Vec<TxRecord>) -> Self {
        Self { records }
    }
}
