//! Node configuration file.
//!
//! ```toml
//! [token]
//! name = "Governance"
//! symbol = "GOV"
//! decimals = 8
//! initial_supply = "100000000000000"
//! owner = "owner-principal"
//! fee = "10000"
//! fee_to = "treasury-principal"   # optional, defaults to owner
//!
//! [logging]                        # optional
//! level = "info"
//! format = "pretty"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use govtoken_ledger::TokenConfig;

use crate::logging::LogFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub token: TokenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging defaults; CLI flags and `RUST_LOG` take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn log_format(&self) -> LogFormat {
        LogFormat::from_str_lossy(&self.format)
    }
}

impl NodeConfig {
    /// Reads and parses a TOML config. Token parameters are validated later,
    /// when the ledger is built.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
