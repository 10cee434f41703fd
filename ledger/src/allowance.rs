//! # Allowance Table
//!
//! `(owner, spender) → amount` stored as a map of maps. As with balances,
//! zero means absent: a zeroed pair is removed, and an owner whose inner
//! map empties is removed too.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TxError;
use crate::types::{AccountId, Amount};

/// Owner → spender → approved amount.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AllowanceTable {
    allowances: HashMap<AccountId, HashMap<AccountId, Amount>>,
}

impl AllowanceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            allowances: HashMap::new(),
        }
    }

    /// Amount `spender` may still spend from `owner`, zero if none.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|inner| inner.get(spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Overwrites the allowance. Zero removes the pair.
    pub fn set_allowance(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        if amount.is_zero() {
            self.remove(owner, spender);
            return;
        }
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    /// Reduces the allowance by `amount` and returns what remains.
    ///
    /// # Errors
    ///
    /// Returns [`TxError::InsufficientAllowance`] if fewer than `amount`
    /// tokens are approved. The table is unchanged in that case.
    pub fn decrement_allowance(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<Amount, TxError> {
        let remaining = self.ensure_covers(owner, spender, amount)?;
        self.set_allowance(owner, spender, remaining);
        Ok(remaining)
    }

    /// Fails with [`TxError::InsufficientAllowance`] unless at least
    /// `required` is approved; otherwise returns what would remain after
    /// spending it. Never mutates.
    pub fn ensure_covers(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        required: Amount,
    ) -> Result<Amount, TxError> {
        let available = self.allowance(owner, spender);
        available
            .checked_sub(required)
            .ok_or_else(|| TxError::InsufficientAllowance {
                owner: owner.clone(),
                spender: spender.clone(),
                available,
                required,
            })
    }

    /// Total number of live (owner, spender) pairs.
    pub fn size(&self) -> usize {
        self.allowances.values().map(HashMap::len).sum()
    }

    /// Every spender approved by `owner`, sorted by spender id.
    pub fn approvals_of(&self, owner: &AccountId) -> Vec<(AccountId, Amount)> {
        let mut approvals: Vec<(AccountId, Amount)> = self
            .allowances
            .get(owner)
            .map(|inner| inner.iter().map(|(s, a)| (s.clone(), *a)).collect())
            .unwrap_or_default();
        approvals.sort_by(|a, b| a.0.cmp(&b.0));
        approvals
    }

    /// Flattened `(owner, spender, amount)` view in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = (&AccountId, &AccountId, &Amount)> {
        self.allowances.iter().flat_map(|(owner, inner)| {
            inner
                .iter()
                .map(move |(spender, amount)| (owner, spender, amount))
        })
    }

    fn remove(&mut self, owner: &AccountId, spender: &AccountId) {
        if let Some(inner) = self.allowances.get_mut(owner) {
            inner.remove(spender);
            if inner.is_empty() {
                self.allowances.remove(owner);
            }
        }
    }
}
