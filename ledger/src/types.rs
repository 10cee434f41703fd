//! Core type definitions for the token ledger.
//!
//! These types form the vocabulary shared by every component: who holds
//! tokens ([`AccountId`]), how many ([`Amount`]), when something happened
//! ([`Timestamp`]) and what happened ([`TxRecord`]).

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::BURN_SINK_ID;

/// Nanoseconds since the Unix epoch, as supplied by the host [`Clock`](crate::clock::Clock).
pub type Timestamp = u64;

/// Position of a record in the transaction log. Doubles as the receipt
/// returned to callers of mutating operations.
pub type TxIndex = usize;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Opaque identifier of a ledger participant.
///
/// The ledger never interprets the contents; the host decides what an
/// identity looks like (a principal, a hex public key, a username) and
/// authenticates it before calling in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved identifier used as the source of mints and the
    /// destination of burns. It never holds a balance.
    pub fn burn_sink() -> Self {
        Self(BURN_SINK_ID.to_string())
    }

    /// Returns `true` if this is the reserved burn sink identifier.
    pub fn is_burn_sink(&self) -> bool {
        self.0 == BURN_SINK_ID
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// Error returned when a string is not a valid decimal token amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount '{0}': expected a non-negative decimal integer")]
pub struct ParseAmountError(pub String);

/// A non-negative token quantity in the smallest unit.
///
/// Backed by a 256-bit unsigned integer. Arithmetic is only exposed through
/// checked operations: an underflow is an insufficient-funds condition and
/// an overflow is rejected, neither ever wraps.
///
/// Human-readable formats (JSON, TOML) carry amounts as decimal strings so
/// that values beyond 2^53 survive JavaScript tooling; plain integers are
/// accepted on input as a convenience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

impl Amount {
    /// Zero tokens.
    pub const ZERO: Amount = Amount(U256([0, 0, 0, 0]));

    /// Returns `true` if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self + other`, or `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// `self - other`, or `None` if `other > self`.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Amount(U256::from(v))
    }
}

impl From<u128> for Amount {
    fn from(v: u128) -> Self {
        Amount(U256::from(v))
    }
}

impl From<U256> for Amount {
    fn from(v: U256) -> Self {
        Amount(v)
    }
}

impl From<Amount> for U256 {
    fn from(v: Amount) -> Self {
        v.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // U256's Display is decimal.
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseAmountError(s.to_string()));
        }
        U256::from_dec_str(trimmed)
            .map(Amount)
            .map_err(|_| ParseAmountError(s.to_string()))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal integer or decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u64::try_from(v)
            .map(Amount::from)
            .map_err(|_| E::custom(format!("negative amount: {}", v)))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(Amount::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse().map_err(E::custom)
    }

    // serde_json hands integers past u64 over as floats.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Err(E::custom(format!(
            "amount {} is not an exact integer; write large amounts as decimal strings, e.g. \"{:.0}\"",
            v, v
        )))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Binary formats are not self-describing; they always carry the
        // string form written by `Serialize`.
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(AmountVisitor)
        } else {
            deserializer.deserialize_str(AmountVisitor)
        }
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The kind of state transition a transaction record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// New supply created by the owner (or the genesis allocation).
    Mint,
    /// Supply destroyed by a holder.
    Burn,
    /// Direct transfer by the holder.
    Transfer,
    /// Transfer executed by a spender against an allowance.
    TransferFrom,
    /// Allowance granted to a spender.
    Approve,
    /// Voting power delegated to another account.
    Delegate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint => write!(f, "mint"),
            Self::Burn => write!(f, "burn"),
            Self::Transfer => write!(f, "transfer"),
            Self::TransferFrom => write!(f, "transferFrom"),
            Self::Approve => write!(f, "approve"),
            Self::Delegate => write!(f, "delegate"),
        }
    }
}

// ---------------------------------------------------------------------------
// TxStatus
// ---------------------------------------------------------------------------

/// Outcome recorded alongside a transaction.
///
/// The ledger itself only ever appends `Succeeded` records; failed
/// preconditions abort before anything is logged. `Failed` exists so that
/// logs imported from elsewhere round-trip without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxStatus {
    Succeeded,
    Failed,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// TxRecord
// ---------------------------------------------------------------------------

/// An immutable entry in the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// The authenticated account that invoked the operation. `None` for
    /// synthetic records such as the genesis allocation.
    pub caller: Option<AccountId>,
    /// What kind of transition this was.
    pub operation: Operation,
    /// Position in the log, assigned at append time.
    pub index: TxIndex,
    /// Source account (the burn sink for mints).
    pub from: AccountId,
    /// Destination account (the burn sink for burns, the spender for
    /// approvals, the delegatee for delegations).
    pub to: AccountId,
    /// Value moved, approved or delegated.
    pub amount: Amount,
    /// Flat fee charged to `from` (or the approving owner).
    pub fee: Amount,
    /// Host time at which the operation executed.
    pub timestamp: Timestamp,
    /// Outcome.
    pub status: TxStatus,
}

impl TxRecord {
    /// Returns `true` if `account` acted as caller, source or destination.
    pub fn involves(&self, account: &AccountId) -> bool {
        self.caller.as_ref() == Some(account) || &self.from == account || &self.to == account
    }
}
