//! # Ledger Service
//!
//! [`TokenLedger`] owns every store and is the only way to change them.
//! Each mutating operation follows the same shape:
//!
//! ```text
//! 1. CHECK  : balance / allowance / ownership preconditions
//! 2. PLAN   : stage checkpoint updates; detect invariant violations
//! 3. APPLY  : fee, debit, credit, allowance, supply
//! 4. COMMIT : write the staged checkpoints
//! 5. LOG    : append exactly one record, return its index
//! ```
//!
//! Steps 1 and 2 are the only ones that can fail, and they run before
//! anything is touched, so every operation is all-or-nothing. Writes take
//! `&mut self` and reads `&self`; for shared access across threads wrap the
//! ledger in a [`SharedLedger`](crate::shared::SharedLedger).
//!
//! ## Fees
//!
//! `transfer`, `transfer_from` and `approve` charge the flat fee to the
//! paying account and credit it to `fee_to`. `approve` stores the
//! fee-inclusive value so that a later `transfer_from` of exactly `value`
//! (which costs `value + fee`) succeeds without a second approval.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::allowance::AllowanceTable;
use crate::balance::BalanceLedger;
use crate::checkpoint::Checkpoint;
use crate::clock::Clock;
use crate::config::TokenConfig;
use crate::delegation::{BalanceChange, DelegationResolver};
use crate::error::{ConfigError, InvariantViolation, LedgerResult, TxError};
use crate::txlog::{NewRecord, TxLog};
use crate::types::{AccountId, Amount, Operation, Timestamp, TxIndex, TxRecord, TxStatus};

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Mutable token-wide settings and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    pub logo: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Amount,
    pub owner: AccountId,
    pub fee: Amount,
    pub fee_to: AccountId,
    /// Host time at construction.
    pub deploy_time: Timestamp,
}

impl TokenStats {
    /// The same checks [`TokenConfig::validate`] runs at construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut config = TokenConfig::new(self.name.clone(), self.symbol.clone(), self.total_supply, self.owner.clone())
            .with_fee(self.fee)
            .with_fee_to(self.fee_to.clone());
        config.decimals = self.decimals;
        config.validate()
    }
}

/// Public token description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub logo: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Amount,
    pub owner: AccountId,
    pub fee: Amount,
}

/// Metadata plus operational status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub metadata: TokenMetadata,
    pub fee_to: AccountId,
    pub history_size: usize,
    pub deploy_time: Timestamp,
    pub holder_count: usize,
}

// ---------------------------------------------------------------------------
// TokenLedger
// ---------------------------------------------------------------------------

/// The governance token ledger.
pub struct TokenLedger {
    pub(crate) stats: TokenStats,
    pub(crate) balances: BalanceLedger,
    pub(crate) allowances: AllowanceTable,
    pub(crate) log: TxLog,
    pub(crate) voting: DelegationResolver,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenLedger")
            .field("stats", &self.stats)
            .field("holders", &self.balances.holder_count())
            .field("history_size", &self.log.len())
            .finish_non_exhaustive()
    }
}

impl TokenLedger {
    /// Creates a ledger with the whole initial supply held by the owner.
    ///
    /// Seeds three things at the current clock time: the owner's balance,
    /// the owner's genesis checkpoint, and log record 0 (a mint from the
    /// burn sink with no caller).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the parameters fail validation.
    pub fn new(config: TokenConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        let now = clock.now();
        let fee_to = config.fee_recipient();
        let stats = TokenStats {
            logo: config.logo,
            name: config.name,
            symbol: config.symbol,
            decimals: config.decimals,
            total_supply: config.initial_supply,
            owner: config.owner,
            fee: config.fee,
            fee_to,
            deploy_time: now,
        };

        let mut balances = BalanceLedger::new();
        if !stats.total_supply.is_zero() {
            balances.insert_restored(stats.owner.clone(), stats.total_supply);
        }

        let mut voting = DelegationResolver::new();
        voting.seed(&stats.owner, stats.total_supply, now);

        let mut log = TxLog::new();
        log.append(NewRecord {
            caller: None,
            operation: Operation::Mint,
            from: AccountId::burn_sink(),
            to: stats.owner.clone(),
            amount: stats.total_supply,
            fee: Amount::ZERO,
            timestamp: now,
            status: TxStatus::Succeeded,
        });

        info!(
            name = %stats.name,
            symbol = %stats.symbol,
            owner = %stats.owner,
            supply = %stats.total_supply,
            fee = %stats.fee,
            "token ledger initialized"
        );

        Ok(Self {
            stats,
            balances,
            allowances: AllowanceTable::new(),
            log,
            voting,
            clock,
        })
    }

    /// Assembles a ledger from restored parts. The snapshot layer validates
    /// them first.
    pub(crate) fn from_parts(
        stats: TokenStats,
        balances: BalanceLedger,
        allowances: AllowanceTable,
        log: TxLog,
        voting: DelegationResolver,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stats,
            balances,
            allowances,
            log,
            voting,
            clock,
        }
    }

    // -- Mutating operations ------------------------------------------------

    /// Moves `value` from `caller` to `to`, charging the flat fee to
    /// `caller`.
    ///
    /// # Errors
    ///
    /// [`TxError::InsufficientBalance`] if `caller` holds less than
    /// `value + fee`.
    pub fn transfer(&mut self, caller: &AccountId, to: &AccountId, value: Amount) -> LedgerResult<TxIndex> {
        let now = self.clock.now();
        let fee = self.stats.fee;
        let required = add(value, fee)?;
        self.balances.ensure_covers(caller, required)?;

        let change = BalanceChange::transfer(caller, to, value, fee, &self.stats.fee_to);
        let plan = self.voting.plan_balance_change(&change)?;

        self.move_funds(caller, to, value, fee)?;
        self.voting.commit(plan, now);

        let index = self.log.append(NewRecord {
            caller: Some(caller.clone()),
            operation: Operation::Transfer,
            from: caller.clone(),
            to: to.clone(),
            amount: value,
            fee,
            timestamp: now,
            status: TxStatus::Succeeded,
        });
        debug!(index, from = %caller, to = %to, %value, %fee, "transfer applied");
        Ok(index)
    }

    /// `caller` spends `value` of `from`'s tokens, sending them to `to`.
    ///
    /// Consumes `value + fee` of the allowance `from` granted `caller`; the
    /// fee is paid by `from`.
    ///
    /// # Errors
    ///
    /// [`TxError::InsufficientAllowance`] is checked first, then
    /// [`TxError::InsufficientBalance`].
    pub fn transfer_from(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        value: Amount,
    ) -> LedgerResult<TxIndex> {
        let now = self.clock.now();
        let fee = self.stats.fee;
        let required = add(value, fee)?;
        self.allowances.ensure_covers(from, caller, required)?;
        self.balances.ensure_covers(from, required)?;

        let change = BalanceChange::transfer(from, to, value, fee, &self.stats.fee_to);
        let plan = self.voting.plan_balance_change(&change)?;

        self.move_funds(from, to, value, fee)?;
        self.allowances.decrement_allowance(from, caller, required)?;
        self.voting.commit(plan, now);

        let index = self.log.append(NewRecord {
            caller: Some(caller.clone()),
            operation: Operation::TransferFrom,
            from: from.clone(),
            to: to.clone(),
            amount: value,
            fee,
            timestamp: now,
            status: TxStatus::Succeeded,
        });
        debug!(index, spender = %caller, from = %from, to = %to, %value, %fee, "transferFrom applied");
        Ok(index)
    }

    /// Lets `spender` move up to `value` of `caller`'s tokens.
    ///
    /// Charges the flat fee immediately and stores `value + fee` (or removes
    /// the approval when `value` is zero). The logged amount is the stored
    /// allowance.
    ///
    /// # Errors
    ///
    /// [`TxError::InsufficientBalance`] if `caller` cannot pay the fee.
    pub fn approve(&mut self, caller: &AccountId, spender: &AccountId, value: Amount) -> LedgerResult<TxIndex> {
        let now = self.clock.now();
        let fee = self.stats.fee;
        self.balances.ensure_covers(caller, fee)?;
        let stored = if value.is_zero() {
            Amount::ZERO
        } else {
            add(value, fee)?
        };

        let change = BalanceChange::fee_only(caller, fee, &self.stats.fee_to);
        let plan = self.voting.plan_balance_change(&change)?;

        self.charge_fee(caller, fee)?;
        self.allowances.set_allowance(caller, spender, stored);
        self.voting.commit(plan, now);

        let index = self.log.append(NewRecord {
            caller: Some(caller.clone()),
            operation: Operation::Approve,
            from: caller.clone(),
            to: spender.clone(),
            amount: stored,
            fee,
            timestamp: now,
            status: TxStatus::Succeeded,
        });
        debug!(index, owner = %caller, spender = %spender, allowance = %stored, "approve applied");
        Ok(index)
    }

    /// Creates `amount` new tokens for `to`. Owner only.
    ///
    /// # Errors
    ///
    /// [`TxError::Unauthorized`] if `caller` is not the owner,
    /// [`TxError::AmountOverflow`] if the supply would overflow.
    pub fn mint(&mut self, caller: &AccountId, to: &AccountId, amount: Amount) -> LedgerResult<TxIndex> {
        let now = self.clock.now();
        self.ensure_owner(caller)?;
        let new_supply = add(self.stats.total_supply, amount)?;

        let plan = self.voting.plan_balance_change(&BalanceChange::mint(to, amount))?;

        self.balances.credit(to, amount)?;
        self.stats.total_supply = new_supply;
        self.voting.commit(plan, now);

        let index = self.log.append(NewRecord {
            caller: Some(caller.clone()),
            operation: Operation::Mint,
            from: AccountId::burn_sink(),
            to: to.clone(),
            amount,
            fee: Amount::ZERO,
            timestamp: now,
            status: TxStatus::Succeeded,
        });
        debug!(index, to = %to, %amount, supply = %new_supply, "mint applied");
        Ok(index)
    }

    /// Destroys `amount` of `caller`'s tokens.
    ///
    /// # Errors
    ///
    /// [`TxError::InsufficientBalance`] if `caller` holds less than `amount`.
    pub fn burn(&mut self, caller: &AccountId, amount: Amount) -> LedgerResult<TxIndex> {
        let now = self.clock.now();
        self.balances.ensure_covers(caller, amount)?;
        let new_supply = self
            .stats
            .total_supply
            .checked_sub(amount)
            .ok_or_else(|| InvariantViolation::supply_underflow(caller, self.stats.total_supply, amount))?;

        let plan = self.voting.plan_balance_change(&BalanceChange::burn(caller, amount))?;

        self.balances.debit(caller, amount)?;
        self.stats.total_supply = new_supply;
        self.voting.commit(plan, now);

        let index = self.log.append(NewRecord {
            caller: Some(caller.clone()),
            operation: Operation::Burn,
            from: caller.clone(),
            to: AccountId::burn_sink(),
            amount,
            fee: Amount::ZERO,
            timestamp: now,
            status: TxStatus::Succeeded,
        });
        debug!(index, from = %caller, %amount, supply = %new_supply, "burn applied");
        Ok(index)
    }

    /// Delegates `caller`'s voting power to `delegatee`. The logged amount
    /// is the power moved (the caller's balance).
    ///
    /// # Errors
    ///
    /// [`TxError::InsufficientBalance`] if `caller` holds nothing; a fatal
    /// invariant violation if the previous delegatee's checkpoint cannot
    /// absorb the withdrawal.
    pub fn delegate(&mut self, caller: &AccountId, delegatee: &AccountId) -> LedgerResult<TxIndex> {
        let now = self.clock.now();
        let moved = self.voting.delegate(&self.balances, caller, delegatee, now)?;

        let index = self.log.append(NewRecord {
            caller: Some(caller.clone()),
            operation: Operation::Delegate,
            from: caller.clone(),
            to: delegatee.clone(),
            amount: moved,
            fee: Amount::ZERO,
            timestamp: now,
            status: TxStatus::Succeeded,
        });
        debug!(index, delegator = %caller, delegatee = %delegatee, power = %moved, "delegate applied");
        Ok(index)
    }

    // -- Administration -----------------------------------------------------

    /// Renames the token. Owner only.
    ///
    /// # Errors
    ///
    /// [`TxError::InvalidSetting`] for a blank name.
    pub fn set_name(&mut self, caller: &AccountId, name: impl Into<String>) -> LedgerResult<()> {
        let name = name.into();
        self.update_stats(caller, |stats| stats.name = name)?;
        info!(name = %self.stats.name, "token name updated");
        Ok(())
    }

    /// Replaces the logo. Owner only.
    pub fn set_logo(&mut self, caller: &AccountId, logo: impl Into<String>) -> LedgerResult<()> {
        let logo = logo.into();
        self.update_stats(caller, |stats| stats.logo = logo)?;
        info!("token logo updated");
        Ok(())
    }

    /// Changes the flat fee. Owner only.
    pub fn set_fee(&mut self, caller: &AccountId, fee: Amount) -> LedgerResult<()> {
        self.update_stats(caller, |stats| stats.fee = fee)?;
        info!(%fee, "transfer fee updated");
        Ok(())
    }

    /// Changes the fee recipient. Owner only.
    ///
    /// # Errors
    ///
    /// [`TxError::InvalidSetting`] if `fee_to` is the burn sink.
    pub fn set_fee_to(&mut self, caller: &AccountId, fee_to: AccountId) -> LedgerResult<()> {
        self.update_stats(caller, |stats| stats.fee_to = fee_to)?;
        info!(fee_to = %self.stats.fee_to, "fee recipient updated");
        Ok(())
    }

    /// Hands ownership to another account. Owner only.
    ///
    /// # Errors
    ///
    /// [`TxError::InvalidSetting`] if `owner` is the burn sink.
    pub fn set_owner(&mut self, caller: &AccountId, owner: AccountId) -> LedgerResult<()> {
        let previous = self.stats.owner.clone();
        self.update_stats(caller, |stats| stats.owner = owner)?;
        info!(from = %previous, to = %self.stats.owner, "ownership transferred");
        Ok(())
    }

    // -- Queries ------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.stats.name
    }

    pub fn symbol(&self) -> &str {
        &self.stats.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.stats.decimals
    }

    pub fn logo(&self) -> &str {
        &self.stats.logo
    }

    pub fn fee(&self) -> Amount {
        self.stats.fee
    }

    pub fn fee_to(&self) -> &AccountId {
        &self.stats.fee_to
    }

    pub fn total_supply(&self) -> Amount {
        self.stats.total_supply
    }

    pub fn owner(&self) -> &AccountId {
        &self.stats.owner
    }

    /// The raw settings and counters.
    pub fn stats(&self) -> &TokenStats {
        &self.stats
    }

    pub fn metadata(&self) -> TokenMetadata {
        TokenMetadata {
            logo: self.stats.logo.clone(),
            name: self.stats.name.clone(),
            symbol: self.stats.symbol.clone(),
            decimals: self.stats.decimals,
            total_supply: self.stats.total_supply,
            owner: self.stats.owner.clone(),
            fee: self.stats.fee,
        }
    }

    pub fn token_info(&self) -> TokenInfo {
        TokenInfo {
            metadata: self.metadata(),
            fee_to: self.stats.fee_to.clone(),
            history_size: self.log.len(),
            deploy_time: self.stats.deploy_time,
            holder_count: self.balances.holder_count(),
        }
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.balance_of(account)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances.allowance(owner, spender)
    }

    /// Number of records in the transaction log, genesis included.
    pub fn history_size(&self) -> usize {
        self.log.len()
    }

    /// # Errors
    ///
    /// [`TxError::IndexOutOfRange`] if `index >= history_size()`.
    pub fn get_transaction(&self, index: TxIndex) -> Result<&TxRecord, TxError> {
        self.log.get(index)
    }

    pub fn get_transactions(&self, start: usize, limit: usize) -> &[TxRecord] {
        self.log.range(start, limit)
    }

    pub fn get_user_transaction_amount(&self, account: &AccountId) -> usize {
        self.log.count_by_participant(account)
    }

    pub fn get_user_transactions(&self, account: &AccountId, start: usize, limit: usize) -> Vec<TxRecord> {
        self.log.filter_by_participant(account, start, limit)
    }

    /// Holders by descending balance.
    pub fn get_holders(&self, start: usize, limit: usize) -> Vec<(AccountId, Amount)> {
        self.balances.holders(start, limit)
    }

    pub fn get_allowance_size(&self) -> usize {
        self.allowances.size()
    }

    pub fn get_user_approvals(&self, owner: &AccountId) -> Vec<(AccountId, Amount)> {
        self.allowances.approvals_of(owner)
    }

    pub fn get_current_votes(&self, account: &AccountId) -> Amount {
        self.voting.checkpoints().current_votes(account)
    }

    pub fn get_prior_votes(&self, account: &AccountId, timestamp: Timestamp) -> Amount {
        self.voting.checkpoints().votes_at_or_before(account, timestamp)
    }

    pub fn get_checkpoints(&self, account: &AccountId) -> &[Checkpoint] {
        self.voting.checkpoints().checkpoints(account)
    }

    pub fn get_delegate(&self, account: &AccountId) -> Option<&AccountId> {
        self.voting.delegate_of(account)
    }

    /// Returns `true` if balances add up to the total supply.
    pub fn is_conserved(&self) -> bool {
        self.balances.total() == Some(self.stats.total_supply)
    }

    // -- Internals ----------------------------------------------------------

    /// Applies `change` to a copy of the stats and keeps it only if the
    /// result still passes the checks a restore would run.
    fn update_stats(&mut self, caller: &AccountId, change: impl FnOnce(&mut TokenStats)) -> Result<(), TxError> {
        self.ensure_owner(caller)?;
        let mut next = self.stats.clone();
        change(&mut next);
        next.validate().map_err(TxError::InvalidSetting)?;
        self.stats = next;
        Ok(())
    }

    fn ensure_owner(&self, caller: &AccountId) -> Result<(), TxError> {
        if caller != &self.stats.owner {
            return Err(TxError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Debits `fee` from `payer` into `fee_to`. No-op for a zero fee.
    fn charge_fee(&mut self, payer: &AccountId, fee: Amount) -> Result<(), TxError> {
        if fee.is_zero() {
            return Ok(());
        }
        self.balances.debit(payer, fee)?;
        let fee_to = self.stats.fee_to.clone();
        self.balances.credit(&fee_to, fee)?;
        Ok(())
    }

    /// Fee first, then value. Preconditions are checked by the caller, and
    /// every balance is bounded by the total supply, so neither leg fails.
    fn move_funds(&mut self, from: &AccountId, to: &AccountId, value: Amount, fee: Amount) -> Result<(), TxError> {
        self.charge_fee(from, fee)?;
        self.balances.debit(from, value)?;
        self.balances.credit(to, value)?;
        Ok(())
    }
}

fn add(a: Amount, b: Amount) -> Result<Amount, TxError> {
    a.checked_add(b).ok_or(TxError::AmountOverflow { current: a, added: b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn acct(s: &str) -> AccountId {
        AccountId::from(s)
    }

    fn amt(v: u64) -> Amount {
        Amount::from(v)
    }

    fn ledger_with_fee(fee: u64) -> (TokenLedger, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let config = TokenConfig::new("Governance", "GOV", amt(1_000), acct("owner")).with_fee(amt(fee));
        let ledger = TokenLedger::new(config, clock.clone()).unwrap();
        (ledger, clock)
    }

    #[test]
    fn genesis_state() {
        let (ledger, _) = ledger_with_fee(1);
        assert_eq!(ledger.balance_of(&acct("owner")), amt(1_000));
        assert_eq!(ledger.total_supply(), amt(1_000));
        assert_eq!(ledger.history_size(), 1);
        assert_eq!(ledger.get_current_votes(&acct("owner")), amt(1_000));

        let genesis = ledger.get_transaction(0).unwrap();
        assert_eq!(genesis.caller, None);
        assert_eq!(genesis.operation, Operation::Mint);
        assert!(genesis.from.is_burn_sink());
        assert_eq!(genesis.to, acct("owner"));
        assert_eq!(genesis.amount, amt(1_000));
        assert_eq!(genesis.timestamp, 1_000);
        assert!(ledger.is_conserved());
    }

    #[test]
    fn invalid_config_rejected() {
        let clock = Arc::new(ManualClock::new(0));
        let config = TokenConfig::new("", "GOV", amt(1), acct("owner"));
        assert!(TokenLedger::new(config, clock).is_err());
    }

    #[test]
    fn transfer_charges_fee_to_recipient() {
        let (mut ledger, _) = ledger_with_fee(2);
        ledger.set_fee_to(&acct("owner"), acct("treasury")).unwrap();
        let index = ledger.transfer(&acct("owner"), &acct("alice"), amt(100)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(ledger.balance_of(&acct("owner")), amt(898));
        assert_eq!(ledger.balance_of(&acct("alice")), amt(100));
        assert_eq!(ledger.balance_of(&acct("treasury")), amt(2));
        assert_eq!(ledger.get_current_votes(&acct("treasury")), amt(2));
        assert!(ledger.is_conserved());
    }

    #[test]
    fn transfer_short_by_fee_rejected() {
        let (mut ledger, _) = ledger_with_fee(1);
        ledger.transfer(&acct("owner"), &acct("alice"), amt(10)).unwrap();
        let err = ledger.transfer(&acct("alice"), &acct("bob"), amt(10)).unwrap_err();
        assert_eq!(
            err.as_rejection(),
            Some(&TxError::InsufficientBalance {
                account: acct("alice"),
                available: amt(10),
                required: amt(11),
            })
        );
        assert_eq!(ledger.history_size(), 2);
    }

    #[test]
    fn zero_value_approve_clears_allowance() {
        let (mut ledger, _) = ledger_with_fee(1);
        ledger.approve(&acct("owner"), &acct("spender"), amt(10)).unwrap();
        assert_eq!(ledger.allowance(&acct("owner"), &acct("spender")), amt(11));
        ledger.approve(&acct("owner"), &acct("spender"), Amount::ZERO).unwrap();
        assert_eq!(ledger.allowance(&acct("owner"), &acct("spender")), Amount::ZERO);
        assert_eq!(ledger.get_allowance_size(), 0);
        assert_eq!(ledger.get_transaction(2).unwrap().amount, Amount::ZERO);
        // Two approvals, two fees, both back to the owner as fee recipient.
        assert_eq!(ledger.balance_of(&acct("owner")), amt(1_000));
    }

    #[test]
    fn approve_without_fee_money_rejected() {
        let (mut ledger, _) = ledger_with_fee(5);
        let err = ledger.approve(&acct("pauper"), &acct("spender"), amt(1)).unwrap_err();
        assert!(matches!(err.as_rejection(), Some(TxError::InsufficientBalance { .. })));
        assert_eq!(ledger.get_allowance_size(), 0);
    }

    #[test]
    fn transfer_from_checks_allowance_before_balance() {
        let (mut ledger, _) = ledger_with_fee(0);
        // "empty" has neither balance nor allowance: allowance wins.
        let err = ledger
            .transfer_from(&acct("spender"), &acct("empty"), &acct("bob"), amt(1))
            .unwrap_err();
        assert!(matches!(err.as_rejection(), Some(TxError::InsufficientAllowance { .. })));
    }

    #[test]
    fn transfer_from_with_allowance_but_no_balance() {
        let (mut ledger, _) = ledger_with_fee(0);
        ledger.transfer(&acct("owner"), &acct("alice"), amt(5)).unwrap();
        ledger.approve(&acct("alice"), &acct("spender"), amt(50)).unwrap();
        let err = ledger
            .transfer_from(&acct("spender"), &acct("alice"), &acct("bob"), amt(10))
            .unwrap_err();
        assert!(matches!(err.as_rejection(), Some(TxError::InsufficientBalance { .. })));
        assert_eq!(ledger.allowance(&acct("alice"), &acct("spender")), amt(50));
    }

    #[test]
    fn mint_owner_only() {
        let (mut ledger, _) = ledger_with_fee(1);
        let err = ledger.mint(&acct("alice"), &acct("alice"), amt(5)).unwrap_err();
        assert_eq!(
            err.as_rejection(),
            Some(&TxError::Unauthorized { caller: acct("alice") })
        );

        let index = ledger.mint(&acct("owner"), &acct("alice"), amt(5)).unwrap();
        let record = ledger.get_transaction(index).unwrap();
        assert!(record.from.is_burn_sink());
        assert_eq!(record.caller, Some(acct("owner")));
        assert_eq!(ledger.total_supply(), amt(1_005));
        assert_eq!(ledger.get_current_votes(&acct("alice")), amt(5));
        assert!(ledger.is_conserved());
    }

    #[test]
    fn burn_reduces_supply() {
        let (mut ledger, _) = ledger_with_fee(1);
        let index = ledger.burn(&acct("owner"), amt(400)).unwrap();
        assert!(ledger.get_transaction(index).unwrap().to.is_burn_sink());
        assert_eq!(ledger.total_supply(), amt(600));
        assert_eq!(ledger.get_current_votes(&acct("owner")), amt(600));
        assert!(ledger.burn(&acct("owner"), amt(601)).is_err());
        assert!(ledger.is_conserved());
    }

    #[test]
    fn delegate_logs_moved_power() {
        let (mut ledger, clock) = ledger_with_fee(0);
        clock.set(2_000);
        let index = ledger.delegate(&acct("owner"), &acct("delegate")).unwrap();
        let record = ledger.get_transaction(index).unwrap();
        assert_eq!(record.operation, Operation::Delegate);
        assert_eq!(record.amount, amt(1_000));
        assert_eq!(ledger.get_delegate(&acct("owner")), Some(&acct("delegate")));
        assert_eq!(ledger.get_current_votes(&acct("delegate")), amt(1_000));
        assert_eq!(ledger.get_prior_votes(&acct("delegate"), 2_000), amt(1_000));

        let err = ledger.delegate(&acct("nobody"), &acct("delegate")).unwrap_err();
        assert!(matches!(err.as_rejection(), Some(TxError::InsufficientBalance { .. })));
    }

    #[test]
    fn admin_setters_gated_and_unlogged() {
        let (mut ledger, _) = ledger_with_fee(1);
        assert!(ledger.set_name(&acct("mallory"), "Evil").is_err());
        ledger.set_name(&acct("owner"), "Renamed").unwrap();
        ledger.set_logo(&acct("owner"), "data:image/png;base64,").unwrap();
        ledger.set_fee(&acct("owner"), amt(3)).unwrap();
        ledger.set_owner(&acct("owner"), acct("heir")).unwrap();
        assert!(ledger.set_fee(&acct("owner"), amt(0)).is_err());
        assert_eq!(ledger.name(), "Renamed");
        assert_eq!(ledger.logo(), "data:image/png;base64,");
        assert_eq!(ledger.fee(), amt(3));
        assert_eq!(ledger.owner(), &acct("heir"));
        assert_eq!(ledger.history_size(), 1);
    }

    #[test]
    fn setters_reject_invalid_metadata() {
        let (mut ledger, _) = ledger_with_fee(1);
        let owner = acct("owner");
        assert_eq!(
            ledger.set_name(&owner, "   ").unwrap_err().as_rejection(),
            Some(&TxError::InvalidSetting(ConfigError::EmptyField("name")))
        );
        assert_eq!(
            ledger.set_fee_to(&owner, AccountId::burn_sink()).unwrap_err().as_rejection(),
            Some(&TxError::InvalidSetting(ConfigError::ReservedAccount("fee_to")))
        );
        assert_eq!(
            ledger.set_owner(&owner, AccountId::burn_sink()).unwrap_err().as_rejection(),
            Some(&TxError::InvalidSetting(ConfigError::ReservedAccount("owner")))
        );
        assert_eq!(ledger.name(), "Governance");
        assert_eq!(ledger.fee_to(), &owner);
        assert_eq!(ledger.owner(), &owner);
        assert_eq!(ledger.stats().validate(), Ok(()));
    }

    #[test]
    fn token_info_reflects_state() {
        let (mut ledger, _) = ledger_with_fee(1);
        ledger.transfer(&acct("owner"), &acct("alice"), amt(10)).unwrap();
        let info = ledger.token_info();
        assert_eq!(info.history_size, 2);
        assert_eq!(info.holder_count, 2);
        assert_eq!(info.deploy_time, 1_000);
        assert_eq!(info.fee_to, acct("owner"));
        assert_eq!(info.metadata.symbol, "GOV");
    }
}
