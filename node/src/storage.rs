//! Snapshot files on disk (bincode).

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use govtoken_ledger::{Clock, LedgerSnapshot, TokenLedger};

/// Reads a snapshot file without restoring it.
pub fn read_snapshot(path: &Path) -> Result<LedgerSnapshot> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    LedgerSnapshot::from_bincode(&bytes)
        .with_context(|| format!("failed to decode snapshot {}", path.display()))
}

/// Reads and restores a ledger.
pub fn load_ledger(path: &Path, clock: Arc<dyn Clock>) -> Result<TokenLedger> {
    let snapshot = read_snapshot(path)?;
    TokenLedger::from_snapshot(snapshot, clock)
        .with_context(|| format!("snapshot {} failed validation", path.display()))
}

/// Writes `ledger`'s snapshot to a temporary sibling of `path`, then
/// renames it into place.
pub fn write_ledger(path: &Path, ledger: &TokenLedger, overwrite: bool) -> Result<()> {
    if !overwrite && path.exists() {
        bail!("refusing to overwrite existing snapshot {}", path.display());
    }
    let bytes = ledger
        .snapshot()
        .to_bincode()
        .context("failed to encode snapshot")?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &bytes)
        .with_context(|| format!("failed to write snapshot {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move snapshot into place at {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), history_size = ledger.history_size(), "snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtoken_ledger::{AccountId, Amount, ManualClock, TokenConfig};

    fn ledger() -> TokenLedger {
        let config = TokenConfig::new("Governance", "GOV", Amount::from(500u64), AccountId::from("owner"));
        TokenLedger::new(config, Arc::new(ManualClock::new(7))).unwrap()
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        let mut ledger = ledger();
        ledger
            .transfer(&AccountId::from("owner"), &AccountId::from("alice"), Amount::from(20u64))
            .unwrap();
        write_ledger(&path, &ledger, false).unwrap();

        let loaded = load_ledger(&path, Arc::new(ManualClock::new(8))).unwrap();
        assert_eq!(loaded.balance_of(&AccountId::from("alice")), Amount::from(20u64));
        assert_eq!(loaded.history_size(), 2);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn refuses_to_clobber_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        write_ledger(&path, &ledger(), false).unwrap();
        assert!(write_ledger(&path, &ledger(), false).is_err());
        write_ledger(&path, &ledger(), true).unwrap();
    }

    #[test]
    fn rejected_admin_batch_keeps_snapshot_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        let mut ledger = ledger();
        let batch: Vec<crate::ops::OpRequest> = serde_json::from_str(
            r#"[
                {"caller": "owner", "op": "setFeeTo", "feeTo": "aaaaa-aa"},
                {"caller": "owner", "op": "setName", "name": " "},
                {"caller": "owner", "op": "setOwner", "owner": "aaaaa-aa"},
                {"caller": "owner", "op": "transfer", "to": "alice", "value": 5}
            ]"#,
        )
        .unwrap();
        let report = crate::ops::apply_batch(&mut ledger, &batch);
        assert_eq!(report.rejected, 3);
        assert_eq!(report.applied, 1);
        assert!(report.outcomes[0].error.as_deref().unwrap().contains("invalid setting"));

        write_ledger(&path, &ledger, false).unwrap();
        let loaded = load_ledger(&path, Arc::new(ManualClock::new(8))).unwrap();
        assert_eq!(loaded.name(), "Governance");
        assert_eq!(loaded.balance_of(&AccountId::from("alice")), Amount::from(5u64));
    }

    #[test]
    fn garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"not a snapshot").unwrap();
        assert!(read_snapshot(&path).is_err());
    }
}
