//! # Delegation Resolver
//!
//! Owns the delegation edges and is the only writer of the
//! [`CheckpointStore`]. Voting power moves in two situations:
//!
//! 1. **Delegation**: the delegator's current balance is taken off the
//!    previous delegatee's checkpoint (if there was one) and added to the
//!    new delegatee's.
//! 2. **Balance changes**: every transfer, fee, mint and burn moves the
//!    same amounts between the literal parties' *own* checkpoints.
//!
//! The two are independent. An account that delegated away still has its
//! own checkpoint adjusted by later transfers, and its delegatee's weight
//! is not updated when the delegator's balance changes afterwards, so votes
//! do not fully "follow" delegation.
//!
//! ## Staging
//!
//! Every adjustment is computed into a [`PowerPlan`] against the current
//! checkpoints and validated in full before anything is written. A
//! decrease that would go negative is an [`InvariantViolation`]: balances
//! and checkpoints have drifted apart, and the operation is aborted with
//! no partial effects.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::balance::BalanceLedger;
use crate::checkpoint::CheckpointStore;
use crate::error::{InvariantViolation, LedgerResult, TxError};
use crate::types::{AccountId, Amount, Timestamp};

// ---------------------------------------------------------------------------
// BalanceChange
// ---------------------------------------------------------------------------

/// The balance deltas of one operation, expressed as voting-power legs.
///
/// `from` loses `amount + fee`, `to` gains `amount`, `fee_to` gains `fee`.
/// `None` stands for the burn sink, which has no checkpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub amount: Amount,
    pub fee: Amount,
    pub fee_to: Option<AccountId>,
}

impl BalanceChange {
    /// `from` pays `amount` to `to` and `fee` to `fee_to`.
    pub fn transfer(
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        fee: Amount,
        fee_to: &AccountId,
    ) -> Self {
        Self {
            from: Some(from.clone()),
            to: Some(to.clone()),
            amount,
            fee,
            fee_to: Some(fee_to.clone()),
        }
    }

    /// `payer` pays only the flat fee (approvals).
    pub fn fee_only(payer: &AccountId, fee: Amount, fee_to: &AccountId) -> Self {
        Self {
            from: Some(payer.clone()),
            to: None,
            amount: Amount::ZERO,
            fee,
            fee_to: Some(fee_to.clone()),
        }
    }

    /// New supply arrives at `to`.
    pub fn mint(to: &AccountId, amount: Amount) -> Self {
        Self {
            from: None,
            to: Some(to.clone()),
            amount,
            fee: Amount::ZERO,
            fee_to: None,
        }
    }

    /// Supply leaves `from`.
    pub fn burn(from: &AccountId, amount: Amount) -> Self {
        Self {
            from: Some(from.clone()),
            to: None,
            amount,
            fee: Amount::ZERO,
            fee_to: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PowerPlan
// ---------------------------------------------------------------------------

/// Validated, not-yet-written checkpoint updates for one operation.
#[derive(Debug, Default)]
#[must_use = "a plan does nothing until committed"]
pub struct PowerPlan {
    /// New absolute power per touched account, in first-touch order.
    staged: Vec<(AccountId, Amount)>,
    /// Delegation edge to record on commit.
    edge: Option<(AccountId, AccountId)>,
}

impl PowerPlan {
    fn current(&self, store: &CheckpointStore, account: &AccountId) -> Amount {
        self.staged
            .iter()
            .find(|(a, _)| a == account)
            .map(|(_, v)| *v)
            .unwrap_or_else(|| store.current_votes(account))
    }

    fn stage(&mut self, account: &AccountId, votes: Amount) {
        match self.staged.iter_mut().find(|(a, _)| a == account) {
            Some(slot) => slot.1 = votes,
            None => self.staged.push((account.clone(), votes)),
        }
    }

    fn decrease(
        &mut self,
        store: &CheckpointStore,
        account: &AccountId,
        amount: Amount,
    ) -> Result<(), InvariantViolation> {
        if amount.is_zero() {
            return Ok(());
        }
        let current = self.current(store, account);
        let next = current.checked_sub(amount).ok_or_else(|| {
            let violation = InvariantViolation::underflow(account, current, amount);
            error!(account = %account, %current, decrease = %amount, "voting power underflow");
            violation
        })?;
        self.stage(account, next);
        Ok(())
    }

    fn increase(
        &mut self,
        store: &CheckpointStore,
        account: &AccountId,
        amount: Amount,
    ) -> Result<(), InvariantViolation> {
        if amount.is_zero() {
            return Ok(());
        }
        let current = self.current(store, account);
        let next = current.checked_add(amount).ok_or_else(|| {
            let violation = InvariantViolation::overflow(account, current, amount);
            error!(account = %account, %current, increase = %amount, "voting power overflow");
            violation
        })?;
        self.stage(account, next);
        Ok(())
    }

    /// Number of accounts whose checkpoint this plan will write.
    pub fn touched(&self) -> usize {
        self.staged.len()
    }
}

// ---------------------------------------------------------------------------
// DelegationResolver
// ---------------------------------------------------------------------------

/// Delegation edges plus the checkpoint store they drive.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DelegationResolver {
    delegates: HashMap<AccountId, AccountId>,
    checkpoints: CheckpointStore,
}

impl DelegationResolver {
    /// Creates a resolver with no edges and no checkpoints.
    pub fn new() -> Self {
        Self {
            delegates: HashMap::new(),
            checkpoints: CheckpointStore::new(),
        }
    }

    /// Read access to the checkpoint store.
    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// The account `delegator` last delegated to, if any.
    pub fn delegate_of(&self, delegator: &AccountId) -> Option<&AccountId> {
        self.delegates.get(delegator)
    }

    /// All delegation edges in arbitrary order.
    pub fn edges(&self) -> impl Iterator<Item = (&AccountId, &AccountId)> {
        self.delegates.iter()
    }

    /// Delegates `delegator`'s voting power to `delegatee` and returns the
    /// amount moved (the delegator's balance right now).
    ///
    /// # Errors
    ///
    /// - [`TxError::InsufficientBalance`] if the delegator holds nothing.
    /// - [`InvariantViolation`] if the previous delegatee's checkpoint is
    ///   smaller than the power being withdrawn from it.
    ///
    /// Nothing is written on error.
    pub fn delegate(
        &mut self,
        balances: &BalanceLedger,
        delegator: &AccountId,
        delegatee: &AccountId,
        now: Timestamp,
    ) -> LedgerResult<Amount> {
        let power = balances.balance_of(delegator);
        if power.is_zero() {
            return Err(TxError::InsufficientBalance {
                account: delegator.clone(),
                available: power,
                required: Amount::from(1u64),
            }
            .into());
        }
        let plan = self.plan_delegation(delegator, delegatee, power)?;
        self.commit(plan, now);
        Ok(power)
    }

    /// Moves voting power between the parties of a balance change.
    ///
    /// # Errors
    ///
    /// [`InvariantViolation`] if a decrease would go negative. Nothing is
    /// written on error.
    pub fn on_balance_change(
        &mut self,
        change: &BalanceChange,
        now: Timestamp,
    ) -> Result<(), InvariantViolation> {
        let plan = self.plan_balance_change(change)?;
        self.commit(plan, now);
        Ok(())
    }

    /// Stages the checkpoint updates for a delegation without writing.
    pub fn plan_delegation(
        &self,
        delegator: &AccountId,
        delegatee: &AccountId,
        power: Amount,
    ) -> Result<PowerPlan, InvariantViolation> {
        let mut plan = PowerPlan::default();
        if let Some(previous) = self.delegates.get(delegator) {
            plan.decrease(&self.checkpoints, previous, power)?;
        }
        plan.increase(&self.checkpoints, delegatee, power)?;
        plan.edge = Some((delegator.clone(), delegatee.clone()));
        Ok(plan)
    }

    /// Stages the checkpoint updates for a balance change without writing.
    pub fn plan_balance_change(&self, change: &BalanceChange) -> Result<PowerPlan, InvariantViolation> {
        let mut plan = PowerPlan::default();
        if let Some(from) = &change.from {
            let outflow = change.amount.checked_add(change.fee).ok_or_else(|| {
                InvariantViolation::overflow(from, self.checkpoints.current_votes(from), change.fee)
            })?;
            plan.decrease(&self.checkpoints, from, outflow)?;
        }
        if let Some(to) = &change.to {
            plan.increase(&self.checkpoints, to, change.amount)?;
        }
        if let Some(fee_to) = &change.fee_to {
            plan.increase(&self.checkpoints, fee_to, change.fee)?;
        }
        Ok(plan)
    }

    /// Writes a previously staged plan. Infallible: all arithmetic was
    /// done while planning.
    pub fn commit(&mut self, plan: PowerPlan, now: Timestamp) {
        for (account, votes) in &plan.staged {
            debug!(account = %account, votes = %votes, "checkpoint written");
            self.checkpoints.write_checkpoint(account, *votes, now);
        }
        if let Some((delegator, delegatee)) = plan.edge {
            self.delegates.insert(delegator, delegatee);
        }
    }

    /// Seeds the genesis checkpoint of the initial holder.
    pub(crate) fn seed(&mut self, account: &AccountId, votes: Amount, now: Timestamp) {
        if !votes.is_zero() {
            self.checkpoints.write_checkpoint(account, votes, now);
        }
    }

    /// Rebuilds a resolver from exported parts.
    pub(crate) fn from_parts(
        delegates: HashMap<AccountId, AccountId>,
        checkpoints: CheckpointStore,
    ) -> Self {
        Self {
            delegates,
            checkpoints,
        }
    }
}
