//! Thread-safe handle to a [`TokenLedger`].
//!
//! Writers are serialized behind a `parking_lot::RwLock`; readers share it.
//! Operations validate before mutating, so a reader can never observe a
//! half-applied transfer.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::ledger::TokenLedger;

/// Cloneable, shared ledger handle.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<RwLock<TokenLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: TokenLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Runs `f` under the shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&TokenLedger) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` under the exclusive lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut TokenLedger) -> R) -> R {
        f(&mut self.inner.write())
    }
}

impl From<TokenLedger> for SharedLedger {
    fn from(ledger: TokenLedger) -> Self {
        Self::new(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::TokenConfig;
    use crate::types::{AccountId, Amount};
    use std::thread;

    #[test]
    fn concurrent_transfers_conserve_supply() {
        let config = TokenConfig::new("Governance", "GOV", Amount::from(10_000u64), AccountId::from("owner"))
            .with_fee(Amount::from(1u64));
        let ledger = TokenLedger::new(config, Arc::new(ManualClock::new(1))).unwrap();
        let shared = SharedLedger::new(ledger);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let to = AccountId::new(format!("user-{i}"));
                    for _ in 0..10 {
                        shared
                            .write(|l| l.transfer(&AccountId::from("owner"), &to, Amount::from(5u64)))
                            .unwrap();
                        assert!(shared.read(|l| l.is_conserved()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        shared.read(|l| {
            assert_eq!(l.history_size(), 81);
            assert_eq!(l.balance_of(&AccountId::from("user-3")), Amount::from(50u64));
            assert_eq!(l.balance_of(&AccountId::from("owner")), Amount::from(9_600u64));
        });
    }
}
