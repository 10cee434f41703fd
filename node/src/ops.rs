//! # Operation Batches
//!
//! `apply` reads a JSON array of operations and runs them in order:
//!
//! ```json
//! [
//!   { "caller": "owner", "op": "transfer", "to": "alice", "value": "100" },
//!   { "caller": "alice", "op": "approve", "spender": "bob", "value": 50 },
//!   { "caller": "bob", "op": "transferFrom", "from": "alice", "to": "carol", "value": 50 },
//!   { "caller": "alice", "op": "delegate", "delegatee": "dave" },
//!   { "caller": "owner", "op": "setFee", "fee": 2 }
//! ]
//! ```
//!
//! A rejected operation is reported and the batch moves on. A fatal
//! invariant violation stops the batch.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use govtoken_ledger::{AccountId, Amount, LedgerError, TokenLedger, TxIndex};

/// One entry of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpRequest {
    pub caller: AccountId,
    #[serde(flatten)]
    pub op: OpKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum OpKind {
    Transfer { to: AccountId, value: Amount },
    TransferFrom { from: AccountId, to: AccountId, value: Amount },
    Approve { spender: AccountId, value: Amount },
    Mint { to: AccountId, amount: Amount },
    Burn { amount: Amount },
    Delegate { delegatee: AccountId },
    SetName { name: String },
    SetLogo { logo: String },
    SetFee { fee: Amount },
    SetFeeTo {
        #[serde(rename = "feeTo")]
        fee_to: AccountId,
    },
    SetOwner { owner: AccountId },
}

impl OpKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::TransferFrom { .. } => "transferFrom",
            Self::Approve { .. } => "approve",
            Self::Mint { .. } => "mint",
            Self::Burn { .. } => "burn",
            Self::Delegate { .. } => "delegate",
            Self::SetName { .. } => "setName",
            Self::SetLogo { .. } => "setLogo",
            Self::SetFee { .. } => "setFee",
            Self::SetFeeTo { .. } => "setFeeTo",
            Self::SetOwner { .. } => "setOwner",
        }
    }
}

/// Result of one batch entry, as printed to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpOutcome {
    pub position: usize,
    pub op: &'static str,
    pub caller: AccountId,
    /// Log index for logged operations; `None` for setters and failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<TxIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub applied: usize,
    pub rejected: usize,
    pub outcomes: Vec<OpOutcome>,
    /// Set when a fatal invariant violation stopped the batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
}

impl BatchReport {
    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }
}

pub fn read_batch(path: &Path) -> Result<Vec<OpRequest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read operations file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid operations file {}", path.display()))
}

/// Runs one request against the ledger.
pub fn execute(ledger: &mut TokenLedger, request: &OpRequest) -> Result<Option<TxIndex>, LedgerError> {
    let caller = &request.caller;
    let index = match &request.op {
        OpKind::Transfer { to, value } => ledger.transfer(caller, to, *value)?,
        OpKind::TransferFrom { from, to, value } => ledger.transfer_from(caller, from, to, *value)?,
        OpKind::Approve { spender, value } => ledger.approve(caller, spender, *value)?,
        OpKind::Mint { to, amount } => ledger.mint(caller, to, *amount)?,
        OpKind::Burn { amount } => ledger.burn(caller, *amount)?,
        OpKind::Delegate { delegatee } => ledger.delegate(caller, delegatee)?,
        OpKind::SetName { name } => return ledger.set_name(caller, name.clone()).map(|()| None),
        OpKind::SetLogo { logo } => return ledger.set_logo(caller, logo.clone()).map(|()| None),
        OpKind::SetFee { fee } => return ledger.set_fee(caller, *fee).map(|()| None),
        OpKind::SetFeeTo { fee_to } => return ledger.set_fee_to(caller, fee_to.clone()).map(|()| None),
        OpKind::SetOwner { owner } => return ledger.set_owner(caller, owner.clone()).map(|()| None),
    };
    Ok(Some(index))
}

/// Applies `requests` in order, stopping at the first fatal error.
pub fn apply_batch(ledger: &mut TokenLedger, requests: &[OpRequest]) -> BatchReport {
    let mut report = BatchReport::default();
    for (position, request) in requests.iter().enumerate() {
        let mut outcome = OpOutcome {
            position,
            op: request.op.name(),
            caller: request.caller.clone(),
            index: None,
            error: None,
        };
        match execute(ledger, request) {
            Ok(index) => {
                report.applied += 1;
                outcome.index = index;
            }
            Err(e) if e.is_fatal() => {
                error!(position, op = outcome.op, error = %e, "fatal ledger fault, stopping batch");
                outcome.error = Some(e.to_string());
                report.fatal = Some(e.to_string());
                report.outcomes.push(outcome);
                break;
            }
            Err(e) => {
                warn!(position, op = outcome.op, caller = %request.caller, error = %e, "operation rejected");
                report.rejected += 1;
                outcome.error = Some(e.to_string());
            }
        }
        report.outcomes.push(outcome);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtoken_ledger::{ManualClock, TokenConfig};
    use std::sync::Arc;

    fn ledger() -> TokenLedger {
        let config = TokenConfig::new("Governance", "GOV", Amount::from(1_000u64), AccountId::from("o"))
            .with_fee(Amount::from(1u64))
            .with_fee_to(AccountId::from("treasury"));
        TokenLedger::new(config, Arc::new(ManualClock::new(1))).unwrap()
    }

    fn parse(json: &str) -> Vec<OpRequest> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_every_kind() {
        let batch = parse(
            r#"[
                {"caller": "o", "op": "transfer", "to": "a", "value": "100"},
                {"caller": "a", "op": "transferFrom", "from": "o", "to": "b", "value": 1},
                {"caller": "o", "op": "approve", "spender": "a", "value": 5},
                {"caller": "o", "op": "mint", "to": "a", "amount": 5},
                {"caller": "a", "op": "burn", "amount": 5},
                {"caller": "a", "op": "delegate", "delegatee": "d"},
                {"caller": "o", "op": "setName", "name": "N"},
                {"caller": "o", "op": "setLogo", "logo": "L"},
                {"caller": "o", "op": "setFee", "fee": 0},
                {"caller": "o", "op": "setFeeTo", "feeTo": "t"},
                {"caller": "o", "op": "setOwner", "owner": "p"}
            ]"#,
        );
        assert_eq!(batch.len(), 11);
        assert_eq!(
            batch[0].op,
            OpKind::Transfer {
                to: AccountId::from("a"),
                value: Amount::from(100u64)
            }
        );
        assert_eq!(batch[9].op.name(), "setFeeTo");
    }

    #[test]
    fn unknown_op_is_a_parse_error() {
        let result: Result<Vec<OpRequest>, _> =
            serde_json::from_str(r#"[{"caller": "o", "op": "steal", "value": 1}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejections_are_reported_and_batch_continues() {
        let mut ledger = ledger();
        let batch = parse(
            r#"[
                {"caller": "o", "op": "transfer", "to": "a", "value": 100},
                {"caller": "a", "op": "transfer", "to": "b", "value": 100},
                {"caller": "a", "op": "approve", "spender": "b", "value": 50},
                {"caller": "b", "op": "transferFrom", "from": "a", "to": "c", "value": 50},
                {"caller": "a", "op": "setFee", "fee": 0}
            ]"#,
        );
        let report = apply_batch(&mut ledger, &batch);
        assert!(!report.is_fatal());
        assert_eq!(report.applied, 3);
        assert_eq!(report.rejected, 2);
        let indices: Vec<Option<TxIndex>> = report.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![Some(1), None, Some(2), Some(3), None]);
        assert!(report.outcomes[1].error.as_deref().unwrap().contains("insufficient balance"));
        assert_eq!(ledger.balance_of(&AccountId::from("a")), Amount::from(48u64));
    }

    #[test]
    fn fatal_error_stops_batch() {
        let mut ledger = ledger();
        let batch = parse(
            r#"[
                {"caller": "o", "op": "transfer", "to": "a", "value": 10},
                {"caller": "a", "op": "delegate", "delegatee": "d1"},
                {"caller": "o", "op": "transfer", "to": "a", "value": 10},
                {"caller": "a", "op": "delegate", "delegatee": "d2"},
                {"caller": "o", "op": "transfer", "to": "a", "value": 10}
            ]"#,
        );
        let report = apply_batch(&mut ledger, &batch);
        assert!(report.is_fatal());
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.applied, 3);
        assert_eq!(ledger.history_size(), 4);
    }

    #[test]
    fn setters_report_no_index() {
        let mut ledger = ledger();
        let batch = parse(r#"[{"caller": "o", "op": "setName", "name": "Renamed"}]"#);
        let report = apply_batch(&mut ledger, &batch);
        assert_eq!(report.applied, 1);
        assert_eq!(report.outcomes[0].index, None);
        assert_eq!(ledger.name(), "Renamed");
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("\"index\""));
    }
}
