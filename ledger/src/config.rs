//! # Ledger Configuration & Constants
//!
//! Every reserved identifier and default lives here, next to the
//! [`TokenConfig`] the host hands to [`TokenLedger::new`](crate::ledger::TokenLedger::new)
//! exactly once.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{AccountId, Amount};

// ---------------------------------------------------------------------------
// Reserved Identifiers
// ---------------------------------------------------------------------------

/// Identifier of the burn sink: the synthetic source of every mint and the
/// destination of every burn. Mints and burns never touch its balance.
pub const BURN_SINK_ID: &str = "aaaaa-aa";

// ---------------------------------------------------------------------------
// Token Parameters
// ---------------------------------------------------------------------------

/// Default display precision when a config omits it.
pub const DEFAULT_DECIMALS: u8 = 8;

/// Upper bound on display precision. Amounts are 256-bit, so 36 decimals
/// still leaves room for a supply well beyond 10^40 whole tokens.
pub const MAX_DECIMALS: u8 = 36;

/// Default page size for paginated queries when a host does not specify one.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// TokenConfig
// ---------------------------------------------------------------------------

/// Initialization parameters for a new ledger.
///
/// Consumed once to seed the genesis balance, the genesis log record and
/// the owner's genesis checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Logo URI or data URL. May be empty.
    #[serde(default)]
    pub logo: String,
    /// Human-readable token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Display precision. The ledger never divides; this is metadata.
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Supply allocated to `owner` at genesis.
    pub initial_supply: Amount,
    /// Account that receives the genesis supply and may mint and
    /// administer the token.
    pub owner: AccountId,
    /// Flat fee charged on transfer, transferFrom and approve.
    #[serde(default)]
    pub fee: Amount,
    /// Fee recipient. Defaults to `owner`.
    #[serde(default)]
    pub fee_to: Option<AccountId>,
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

impl TokenConfig {
    /// Minimal config: no logo, default precision, zero fee, fees to owner.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        initial_supply: Amount,
        owner: AccountId,
    ) -> Self {
        Self {
            logo: String::new(),
            name: name.into(),
            symbol: symbol.into(),
            decimals: DEFAULT_DECIMALS,
            initial_supply,
            owner,
            fee: Amount::ZERO,
            fee_to: None,
        }
    }

    /// Builder-style fee setter.
    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    /// Builder-style fee recipient setter.
    pub fn with_fee_to(mut self, fee_to: AccountId) -> Self {
        self.fee_to = Some(fee_to);
        self
    }

    /// The effective fee recipient.
    pub fn fee_recipient(&self) -> AccountId {
        self.fee_to.clone().unwrap_or_else(|| self.owner.clone())
    }

    /// Checks the parameters without building anything.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty name or symbol, an excessive
    /// precision, or the burn sink used as owner or fee recipient.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyField("name"));
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptyField("symbol"));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigError::DecimalsTooHigh {
                got: self.decimals,
                max: MAX_DECIMALS,
            });
        }
        if self.owner.is_burn_sink() {
            return Err(ConfigError::ReservedAccount("owner"));
        }
        if self.fee_recipient().is_burn_sink() {
            return Err(ConfigError::ReservedAccount("fee_to"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenConfig {
        TokenConfig::new("Governance", "GOV", Amount::from(1_000u64), "owner".into())
    }

    #[test]
    fn valid_config_passes() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn empty_name_rejected() {
        let mut cfg = sample();
        cfg.name = "  ".into();
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyField("name")));
    }

    #[test]
    fn excessive_decimals_rejected() {
        let mut cfg = sample();
        cfg.decimals = MAX_DECIMALS + 1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::DecimalsTooHigh { .. })
        ));
    }

    #[test]
    fn burn_sink_cannot_own_or_collect_fees() {
        let mut cfg = sample();
        cfg.owner = AccountId::burn_sink();
        assert_eq!(cfg.validate(), Err(ConfigError::ReservedAccount("owner")));

        let cfg = sample().with_fee_to(AccountId::burn_sink());
        assert_eq!(cfg.validate(), Err(ConfigError::ReservedAccount("fee_to")));
    }

    #[test]
    fn fee_recipient_defaults_to_owner() {
        assert_eq!(sample().fee_recipient(), AccountId::from("owner"));
        assert_eq!(
            sample().with_fee_to("treasury".into()).fee_recipient(),
            AccountId::from("treasury")
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: TokenConfig = serde_json::from_str(
            r#"{"name":"Gov","symbol":"GOV","initial_supply":"1000","owner":"o"}"#,
        )
        .unwrap();
        assert_eq!(cfg.decimals, DEFAULT_DECIMALS);
        assert_eq!(cfg.fee, Amount::ZERO);
        assert!(cfg.logo.is_empty());
        assert_eq!(cfg.fee_to, None);
    }
}
