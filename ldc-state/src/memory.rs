//! In-memory chain state with all-or-nothing transaction application.
//!
//! Accounts and stake ledgers are stored encoded. Accounts loaded during a
//! transaction are cached as shared handles and written back on
//! [`ChainState::commit`], or dropped on [`ChainState::revert`].

use ldc_common::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::account::{Account, AccountData, AccountType};
use crate::stake::AccountLedger;
use crate::ChainState;

#[derive(Debug, Default)]
pub struct MemoryState {
    accounts: BTreeMap<Address, Vec<u8>>,
    ledgers: BTreeMap<Address, Vec<u8>>,
    touched: HashMap<Address, Arc<Account>>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs an account directly, bypassing transactions. Used for
    /// genesis allocations and snapshots.
    pub fn import_account(
        &mut self,
        data: AccountData,
        ledger: Option<AccountLedger>,
    ) -> LedgerResult<()> {
        let id = data.id;
        self.touched.remove(&id);
        self.accounts.insert(id, data.encode()?);
        match ledger {
            Some(ledger) => {
                self.ledgers.insert(id, ledger.encode()?);
            }
            None => {
                self.ledgers.remove(&id);
            }
        }
        Ok(())
    }

    /// Committed data of `id`, if it was ever stored.
    pub fn account(&self, id: &Address) -> LedgerResult<Option<AccountData>> {
        self.accounts
            .get(id)
            .map(|bytes| AccountData::decode(bytes))
            .transpose()
            .map_err(LedgerError::from)
    }

    /// Committed stake ledger of `id`, if any.
    pub fn ledger(&self, id: &Address) -> LedgerResult<Option<AccountLedger>> {
        self.ledgers
            .get(id)
            .map(|bytes| AccountLedger::decode(bytes))
            .transpose()
            .map_err(LedgerError::from)
    }

    /// All committed accounts ordered by address.
    pub fn export_accounts(&self) -> LedgerResult<Vec<AccountData>> {
        self.accounts
            .values()
            .map(|bytes| AccountData::decode(bytes).map_err(LedgerError::from))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl ChainState for MemoryState {
    fn load_account(&mut self, id: &Address) -> LedgerResult<Arc<Account>> {
        if let Some(acc) = self.touched.get(id) {
            return Ok(Arc::clone(acc));
        }

        let acc = match self.accounts.get(id) {
            Some(bytes) => Account::from_data(AccountData::decode(bytes)?, None),
            None => Account::new(*id),
        };
        trace!(account = %id, "account loaded");

        let acc = Arc::new(acc);
        self.touched.insert(*id, Arc::clone(&acc));
        Ok(acc)
    }

    fn load_ledger(&mut self, acc: &Account) -> LedgerResult<()> {
        if acc.has_ledger() {
            return Ok(());
        }
        if acc.account_type() != AccountType::Stake && !acc.is_empty() {
            return Ok(());
        }

        let id = acc.id();
        let ledger = match self.ledgers.get(&id) {
            Some(bytes) => AccountLedger::decode(bytes)?,
            None => AccountLedger::default(),
        };
        acc.init_ledger(ledger)
    }

    fn load_miner(&mut self, miner: &StakeSymbol) -> LedgerResult<Arc<Account>> {
        self.load_account(&miner.address())
    }

    fn commit(&mut self) -> LedgerResult<()> {
        let mut encoded = Vec::with_capacity(self.touched.len());
        for (id, acc) in &self.touched {
            let (data, ledger) = acc.snapshot();
            // an unloaded ledger is left as stored
            let ledger = match ledger {
                Some(l) if data.account_type == AccountType::Stake || !l.is_empty() => {
                    Some(Some(l.encode()?))
                }
                Some(_) => Some(None),
                None => None,
            };
            encoded.push((*id, data.encode()?, ledger));
        }

        debug!(accounts = encoded.len(), "committing state");
        for (id, data, ledger) in encoded {
            self.accounts.insert(id, data);
            match ledger {
                Some(Some(bytes)) => {
                    self.ledgers.insert(id, bytes);
                }
                Some(None) => {
                    self.ledgers.remove(&id);
                }
                None => {}
            }
        }
        self.touched.clear();
        Ok(())
    }

    fn revert(&mut self) {
        debug!(accounts = self.touched.len(), "reverting state");
        self.touched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldc_common::types::ADDRESS_SIZE;
    use num_traits::Zero;
    use std::str::FromStr;

    fn addr(b: u8) -> Address {
        Address::new([b; ADDRESS_SIZE])
    }

    #[test]
    fn test_unknown_account_loads_empty() {
        let mut state = MemoryState::new();
        let acc = state.load_account(&addr(1)).unwrap();
        assert!(acc.is_empty());
        assert!(acc.balance().is_zero());
    }

    #[test]
    fn test_load_account_is_cached_per_transaction() {
        let mut state = MemoryState::new();
        let a = state.load_account(&addr(1)).unwrap();
        let b = state.load_account(&addr(1)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_commit_persists_and_revert_discards() {
        let mut state = MemoryState::new();
        let acc = state.load_account(&addr(1)).unwrap();
        acc.add(&TokenSymbol::NATIVE, &ldc(5)).unwrap();
        state.commit().unwrap();
        assert_eq!(state.account(&addr(1)).unwrap().unwrap().balance, ldc(5));

        let acc = state.load_account(&addr(1)).unwrap();
        acc.add(&TokenSymbol::NATIVE, &ldc(5)).unwrap();
        state.revert();
        assert_eq!(state.account(&addr(1)).unwrap().unwrap().balance, ldc(5));
        assert_eq!(state.load_account(&addr(1)).unwrap().balance(), ldc(5));
    }

    #[test]
    fn test_ledger_loaded_only_for_stake_candidates() {
        let mut state = MemoryState::new();
        let mut data = AccountData::new(addr(1));
        data.nonce = 3;
        state.import_account(data, None).unwrap();

        let used = state.load_account(&addr(1)).unwrap();
        state.load_ledger(&used).unwrap();
        assert!(!used.has_ledger());

        let pool = StakeSymbol::from_str("#POOL").unwrap();
        let fresh = state.load_miner(&pool).unwrap();
        state.load_ledger(&fresh).unwrap();
        assert!(fresh.has_ledger());
    }

    #[test]
    fn test_empty_ledger_of_plain_account_not_persisted() {
        let mut state = MemoryState::new();
        let acc = state.load_account(&addr(1)).unwrap();
        state.load_ledger(&acc).unwrap();
        state.commit().unwrap();
        assert!(state.ledger(&addr(1)).unwrap().is_none());
    }

    #[test]
    fn test_unloaded_ledger_survives_commit() {
        let mut state = MemoryState::new();
        let pool = StakeSymbol::from_str("#POOL").unwrap().address();
        let mut data = AccountData::new(pool);
        data.account_type = AccountType::Stake;
        let mut ledger = AccountLedger::default();
        ledger.stake.insert(addr(1), Default::default());
        state.import_account(data, Some(ledger.clone())).unwrap();

        let acc = state.load_account(&pool).unwrap();
        acc.add(&TokenSymbol::NATIVE, &ldc(1)).unwrap();
        state.commit().unwrap();
        assert_eq!(state.ledger(&pool).unwrap(), Some(ledger));
    }

    #[test]
    fn test_export_accounts_sorted() {
        let mut state = MemoryState::new();
        for b in [3u8, 1, 2] {
            state.import_account(AccountData::new(addr(b)), None).unwrap();
        }
        let ids: Vec<Address> = state
            .export_accounts()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![addr(1), addr(2), addr(3)]);
        assert_eq!(state.len(), 3);
    }
}
