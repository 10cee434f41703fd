//! Error taxonomy for the ledger.
//!
//! Two families:
//!
//! - [`TxError`]: the caller asked for something the ledger state does not
//!   allow (not enough balance, no allowance, wrong identity, a setting
//!   that would break the metadata). Always pure:
//!   nothing was mutated and nothing was logged.
//! - [`InvariantViolation`]: the ledger's own bookkeeping disagrees with
//!   itself. This is a bug, not bad input, and hosts should treat it as
//!   fatal.
//!
//! Mutating operations return [`LedgerError`], which wraps either.

use thiserror::Error;

use crate::types::{AccountId, Amount, TxIndex};

// ---------------------------------------------------------------------------
// User-facing errors
// ---------------------------------------------------------------------------

/// Precondition failures surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// The account does not hold enough tokens for the operation
    /// (including the flat fee where one applies).
    #[error("insufficient balance: {account} has {available}, needs {required}")]
    InsufficientBalance {
        /// Account being debited.
        account: AccountId,
        /// Its current balance.
        available: Amount,
        /// What the operation needed.
        required: Amount,
    },

    /// The spender's allowance does not cover value plus fee.
    #[error("insufficient allowance: {spender} may spend {available} of {owner}'s tokens, needs {required}")]
    InsufficientAllowance {
        /// Account whose tokens are being spent.
        owner: AccountId,
        /// Account spending them.
        spender: AccountId,
        /// Remaining approved amount.
        available: Amount,
        /// What the operation needed.
        required: Amount,
    },

    /// The caller is not the token owner.
    #[error("unauthorized: {caller} is not the token owner")]
    Unauthorized {
        /// The rejected caller.
        caller: AccountId,
    },

    /// Direct lookup of a log record past the end of the log.
    #[error("transaction index {index} out of range (history size {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: TxIndex,
        /// Current log length.
        len: usize,
    },

    /// The result would not fit in 256 bits.
    #[error("amount overflow: {current} + {added} exceeds the representable range")]
    AmountOverflow {
        /// Value before the addition.
        current: Amount,
        /// Value being added.
        added: Amount,
    },

    /// An admin change would leave the token metadata invalid.
    #[error("invalid setting: {0}")]
    InvalidSetting(ConfigError),
}

// ---------------------------------------------------------------------------
// Internal invariant violations
// ---------------------------------------------------------------------------

/// The ledger's own bookkeeping disagrees with itself: a checkpoint (or the
/// total supply) would go negative or overflow.
///
/// Balances and checkpoints have drifted apart. The operation that hit
/// this was aborted before mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ledger invariant violated for {account}: {detail} (current {current})")]
pub struct InvariantViolation {
    /// Account whose bookkeeping could not be updated.
    pub account: AccountId,
    /// The value before the failed update.
    pub current: Amount,
    /// What was attempted.
    pub detail: String,
}

impl InvariantViolation {
    pub(crate) fn underflow(account: &AccountId, current: Amount, decrease: Amount) -> Self {
        Self {
            account: account.clone(),
            current,
            detail: format!("cannot subtract {} from voting power", decrease),
        }
    }

    pub(crate) fn overflow(account: &AccountId, current: Amount, increase: Amount) -> Self {
        Self {
            account: account.clone(),
            current,
            detail: format!("cannot add {} to voting power", increase),
        }
    }

    pub(crate) fn supply_underflow(account: &AccountId, supply: Amount, burned: Amount) -> Self {
        Self {
            account: account.clone(),
            current: supply,
            detail: format!("burning {} exceeds total supply", burned),
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerError
// ---------------------------------------------------------------------------

/// Error returned by every mutating ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The request was rejected; ledger state is unchanged.
    #[error(transparent)]
    Rejected(#[from] TxError),

    /// Internal bookkeeping is inconsistent; ledger state is unchanged but
    /// cannot be trusted.
    #[error("fatal ledger fault: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl LedgerError {
    /// Returns `true` for internal invariant violations, which indicate a
    /// bug rather than invalid caller input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }

    /// The user-facing error, if this is one.
    pub fn as_rejection(&self) -> Option<&TxError> {
        match self {
            Self::Rejected(e) => Some(e),
            Self::Invariant(_) => None,
        }
    }
}

/// Convenience alias for ledger results.
pub type LedgerResult<T> = Result<T, LedgerError>;

// ---------------------------------------------------------------------------
// Construction / restore errors
// ---------------------------------------------------------------------------

/// Invalid initialization parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required text field is empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// More decimal places than the ledger supports.
    #[error("decimals {got} exceeds maximum of {max}")]
    DecimalsTooHigh {
        /// Requested precision.
        got: u8,
        /// Supported maximum.
        max: u8,
    },

    /// The burn sink cannot own or receive fees for the token.
    #[error("{0} cannot be the reserved burn sink account")]
    ReservedAccount(&'static str),
}

/// A snapshot could not be restored or encoded.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Balances do not add up to the recorded total supply.
    #[error("balances sum to {sum} but total supply is {total_supply}")]
    SupplyMismatch {
        /// Sum of all balance entries.
        sum: Amount,
        /// Recorded total supply.
        total_supply: Amount,
    },

    /// A zero-valued entry, which live state never contains.
    #[error("zero-valued {kind} entry for {account}")]
    ZeroEntry {
        /// "balance" or "allowance".
        kind: &'static str,
        /// Owning account.
        account: AccountId,
    },

    /// The same key appears twice.
    #[error("duplicate {kind} entry for {key}")]
    DuplicateEntry {
        /// Which collection.
        kind: &'static str,
        /// Rendered key.
        key: String,
    },

    /// Log record at position `position` claims index `index`.
    #[error("transaction record at position {position} has index {index}")]
    MisindexedRecord {
        /// Position in the exported sequence.
        position: usize,
        /// Index stored in the record.
        index: TxIndex,
    },

    /// Checkpoints are not strictly increasing in time.
    #[error("checkpoints for {account} are not strictly ordered by timestamp")]
    UnorderedCheckpoints {
        /// Account whose sequence is broken.
        account: AccountId,
    },

    /// Summing balances overflowed.
    #[error("balance total overflows")]
    Overflow,

    /// The metadata is itself invalid.
    #[error("invalid metadata: {0}")]
    Metadata(#[from] ConfigError),

    /// Binary encoding failed.
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON encoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        let rejected: LedgerError = TxError::Unauthorized {
            caller: "mallory".into(),
        }
        .into();
        assert!(!rejected.is_fatal());
        assert!(rejected.as_rejection().is_some());

        let fatal: LedgerError =
            InvariantViolation::underflow(&"alice".into(), Amount::from(1u64), Amount::from(2u64))
                .into();
        assert!(fatal.is_fatal());
        assert!(fatal.as_rejection().is_none());
    }

    #[test]
    fn messages_carry_context() {
        let err = TxError::InsufficientBalance {
            account: "alice".into(),
            available: Amount::from(5u64),
            required: Amount::from(11u64),
        };
        assert_eq!(err.to_string(), "insufficient balance: alice has 5, needs 11");

        let err = InvariantViolation::underflow(&"bob".into(), Amount::from(3u64), Amount::from(4u64));
        assert_eq!(
            err.to_string(),
            "ledger invariant violated for bob: cannot subtract 4 from voting power (current 3)"
        );
    }
}
