//! JSON replay documents: an account snapshot plus transactions to apply.

use ldc_common::prelude::*;
use ldc_state::{AccountData, AccountLedger, MemoryState};
use ldc_transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account: AccountData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<AccountLedger>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayDocument {
    pub accounts: Vec<AccountSnapshot>,
    pub transactions: Vec<Transaction>,
}

impl ReplayDocument {
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Installs the snapshot accounts into a fresh state.
    pub fn genesis(&self) -> LedgerResult<MemoryState> {
        let mut state = MemoryState::new();
        for snap in &self.accounts {
            state.import_account(snap.account.clone(), snap.ledger.clone())?;
        }
        Ok(state)
    }
}

/// Every committed account of `state` with its stake ledger.
pub fn export(state: &MemoryState) -> LedgerResult<Vec<AccountSnapshot>> {
    state
        .export_accounts()?
        .into_iter()
        .map(|account| {
            let ledger = state.ledger(&account.id)?;
            Ok(AccountSnapshot { account, ledger })
        })
        .collect()
}
