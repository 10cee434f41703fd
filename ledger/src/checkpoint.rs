//! # Checkpoint Store
//!
//! Per-account history of voting power as `(timestamp, votes)` pairs,
//! strictly increasing in timestamp. Two writes at the same timestamp
//! collapse into one entry, so "the power at time t" is always well
//! defined.
//!
//! ## Point-in-time lookup
//!
//! ```text
//! no checkpoints          -> 0
//! latest.ts   <= t        -> latest      (current-time queries, O(1))
//! earliest.ts >  t        -> earliest    (best known lower bound)
//! otherwise               -> binary search for greatest ts <= t
//! ```
//!
//! The second-to-last rule returns the earliest snapshot for times before
//! an account's first checkpoint rather than zero. Governance callers that
//! need "no power before first activity" must check
//! [`CheckpointStore::checkpoints`] themselves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{AccountId, Amount, Timestamp};

/// Voting power of one account from `timestamp` until the next checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub timestamp: Timestamp,
    pub votes: Amount,
}

/// Account → ordered checkpoint sequence.
///
/// Read access is public; writes are crate-private because only the
/// [`DelegationResolver`](crate::delegation::DelegationResolver) may move
/// voting power.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckpointStore {
    checkpoints: HashMap<AccountId, Vec<Checkpoint>>,
}

impl CheckpointStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            checkpoints: HashMap::new(),
        }
    }

    /// Records `votes` for `account` at `timestamp`.
    ///
    /// Overwrites the latest checkpoint when the timestamps match and
    /// appends otherwise. A timestamp earlier than the latest one (host
    /// clock stepped backwards) is treated as the latest timestamp so the
    /// sequence stays sorted.
    pub(crate) fn write_checkpoint(&mut self, account: &AccountId, votes: Amount, timestamp: Timestamp) {
        let sequence = self.checkpoints.entry(account.clone()).or_default();
        match sequence.last_mut() {
            Some(latest) if latest.timestamp >= timestamp => {
                if latest.timestamp > timestamp {
                    warn!(
                        account = %account,
                        latest = latest.timestamp,
                        requested = timestamp,
                        "checkpoint timestamp went backwards; overwriting latest"
                    );
                }
                latest.votes = votes;
            }
            _ => sequence.push(Checkpoint { timestamp, votes }),
        }
    }

    /// Power of the latest checkpoint, zero if the account has none.
    pub fn current_votes(&self, account: &AccountId) -> Amount {
        self.checkpoints
            .get(account)
            .and_then(|seq| seq.last())
            .map(|cp| cp.votes)
            .unwrap_or(Amount::ZERO)
    }

    /// Power as of `timestamp`. See the module docs for the exact rules.
    pub fn votes_at_or_before(&self, account: &AccountId, timestamp: Timestamp) -> Amount {
        let sequence = match self.checkpoints.get(account) {
            Some(seq) => seq.as_slice(),
            None => return Amount::ZERO,
        };
        let (first, last) = match (sequence.first(), sequence.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Amount::ZERO,
        };
        if last.timestamp <= timestamp {
            return last.votes;
        }
        if first.timestamp > timestamp {
            return first.votes;
        }

        // Invariant: sequence[low].ts <= timestamp < sequence[high].ts.
        let mut low = 0;
        let mut high = sequence.len() - 1;
        while high - low > 1 {
            let mid = low + (high - low) / 2;
            if sequence[mid].timestamp <= timestamp {
                low = mid;
            } else {
                high = mid;
            }
        }
        sequence[low].votes
    }

    /// The full sequence for `account`, oldest first.
    pub fn checkpoints(&self, account: &AccountId) -> &[Checkpoint] {
        self.checkpoints
            .get(account)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of checkpoints recorded for `account`.
    pub fn checkpoint_count(&self, account: &AccountId) -> usize {
        self.checkpoints(account).len()
    }

    /// Every account with at least one checkpoint, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &[Checkpoint])> {
        self.checkpoints
            .iter()
            .map(|(account, seq)| (account, seq.as_slice()))
    }

    /// Installs a restored sequence. Returns `false` if the account was
    /// already present. Empty sequences are dropped.
    pub(crate) fn insert_restored(&mut self, account: AccountId, sequence: Vec<Checkpoint>) -> bool {
        if sequence.is_empty() {
            return !self.checkpoints.contains_key(&account);
        }
        self.checkpoints.insert(account, sequence).is_none()
    }
}
