//! # Balance Ledger
//!
//! Maps each account to the tokens it holds. Absent and zero are the same
//! thing: an entry that reaches zero is removed, so the map only ever
//! contains actual holders and `len()` is the holder count.
//!
//! Conservation (sum of entries == total supply) is not checked here on
//! every call; it follows from the [`TokenLedger`](crate::ledger::TokenLedger)
//! pairing every debit with equal credits (or a matching supply change).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TxError;
use crate::types::{AccountId, Amount};

/// Account → balance table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BalanceLedger {
    balances: HashMap<AccountId, Amount>,
}

impl BalanceLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// Balance of `account`, zero if it holds nothing.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    /// Adds `amount` to `account` and returns the new balance.
    ///
    /// Crediting zero leaves the table untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TxError::AmountOverflow`] if the balance would exceed the
    /// 256-bit range.
    pub fn credit(&mut self, account: &AccountId, amount: Amount) -> Result<Amount, TxError> {
        let current = self.balance_of(account);
        if amount.is_zero() {
            return Ok(current);
        }
        let new_balance = current
            .checked_add(amount)
            .ok_or(TxError::AmountOverflow {
                current,
                added: amount,
            })?;
        self.balances.insert(account.clone(), new_balance);
        Ok(new_balance)
    }

    /// Subtracts `amount` from `account` and returns the new balance,
    /// removing the entry when it reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`TxError::InsufficientBalance`] if the account holds less
    /// than `amount`. The table is unchanged in that case.
    pub fn debit(&mut self, account: &AccountId, amount: Amount) -> Result<Amount, TxError> {
        let current = self.balance_of(account);
        let new_balance = current
            .checked_sub(amount)
            .ok_or_else(|| TxError::InsufficientBalance {
                account: account.clone(),
                available: current,
                required: amount,
            })?;
        if new_balance.is_zero() {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), new_balance);
        }
        Ok(new_balance)
    }

    /// Fails with [`TxError::InsufficientBalance`] unless `account` holds at
    /// least `required`. Never mutates.
    pub fn ensure_covers(&self, account: &AccountId, required: Amount) -> Result<(), TxError> {
        let available = self.balance_of(account);
        if available < required {
            return Err(TxError::InsufficientBalance {
                account: account.clone(),
                available,
                required,
            });
        }
        Ok(())
    }

    /// Number of accounts with a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// A page of holders sorted by descending balance.
    ///
    /// Equal balances are ordered by account id so the listing is stable
    /// across calls. Returns an empty page when `start` is past the end.
    pub fn holders(&self, start: usize, limit: usize) -> Vec<(AccountId, Amount)> {
        let mut all: Vec<(AccountId, Amount)> = self
            .balances
            .iter()
            .map(|(account, amount)| (account.clone(), *amount))
            .collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        all.into_iter().skip(start).take(limit).collect()
    }

    /// Sum of all balances, or `None` if it overflows.
    pub fn total(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(Amount::ZERO, |acc, v| acc.checked_add(*v))
    }

    /// Iterates over all non-zero entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.balances.iter()
    }

    /// Inserts a restored entry. Callers validate before calling.
    pub(crate) fn insert_restored(&mut self, account: AccountId, amount: Amount) -> bool {
        self.balances.insert(account, amount).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(s: &str) -> AccountId {
        AccountId::from(s)
    }

    #[test]
    fn absent_account_has_zero() {
        let ledger = BalanceLedger::new();
        assert_eq!(ledger.balance_of(&acct("nobody")), Amount::ZERO);
        assert_eq!(ledger.holder_count(), 0);
    }

    #[test]
    fn credit_then_debit() {
        let mut ledger = BalanceLedger::new();
        assert_eq!(ledger.credit(&acct("a"), Amount::from(100u64)).unwrap(), Amount::from(100u64));
        assert_eq!(ledger.debit(&acct("a"), Amount::from(40u64)).unwrap(), Amount::from(60u64));
        assert_eq!(ledger.balance_of(&acct("a")), Amount::from(60u64));
    }

    #[test]
    fn zero_credit_creates_no_entry() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&acct("a"), Amount::ZERO).unwrap();
        assert_eq!(ledger.holder_count(), 0);
    }

    #[test]
    fn debit_to_zero_removes_entry() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&acct("a"), Amount::from(5u64)).unwrap();
        ledger.debit(&acct("a"), Amount::from(5u64)).unwrap();
        assert_eq!(ledger.holder_count(), 0);
        assert_eq!(ledger.balance_of(&acct("a")), Amount::ZERO);
    }

    #[test]
    fn overdraft_rejected_without_mutation() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&acct("a"), Amount::from(5u64)).unwrap();
        let err = ledger.debit(&acct("a"), Amount::from(6u64)).unwrap_err();
        assert_eq!(
            err,
            TxError::InsufficientBalance {
                account: acct("a"),
                available: Amount::from(5u64),
                required: Amount::from(6u64),
            }
        );
        assert_eq!(ledger.balance_of(&acct("a")), Amount::from(5u64));
        assert!(ledger.ensure_covers(&acct("a"), Amount::from(5u64)).is_ok());
        assert!(ledger.ensure_covers(&acct("a"), Amount::from(6u64)).is_err());
    }

    #[test]
    fn holders_sorted_descending_with_stable_ties() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&acct("c"), Amount::from(10u64)).unwrap();
        ledger.credit(&acct("a"), Amount::from(30u64)).unwrap();
        ledger.credit(&acct("b"), Amount::from(10u64)).unwrap();

        let page = ledger.holders(0, 10);
        let ids: Vec<&str> = page.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        assert_eq!(ledger.holders(1, 1), vec![(acct("b"), Amount::from(10u64))]);
        assert!(ledger.holders(3, 10).is_empty());
        assert!(ledger.holders(100, 10).is_empty());
    }

    #[test]
    fn total_sums_entries() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&acct("a"), Amount::from(1u64)).unwrap();
        ledger.credit(&acct("b"), Amount::from(2u64)).unwrap();
        assert_eq!(ledger.total(), Some(Amount::from(3u64)));
    }
}
