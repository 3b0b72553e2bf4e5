//! Account state: the balance ledger, the authorization model and the nonce
//! table of one address.
//!
//! Every [`Account`] guards its data with its own mutex. Mutating methods take
//! the lock for their whole duration through [`Account::mutate`], so a call
//! either runs to completion or returns the first violated precondition with
//! the lock released.

use ldc_common::prelude::*;
use ldc_common::validation::ValidationUtils;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::lending::AccountLending;
use crate::stake::{AccountLedger, StakeConfig};

/// Furthest an entry of the nonce table may expire, relative to now
pub const MAX_NONCE_TABLE_EXPIRE: u64 = 30 * 24 * 3600;

/// Maximum number of pre-authorized nonces per expiry slot
pub const MAX_NONCES_PER_SLOT: usize = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    Native,
    Token,
    Stake,
}

impl AccountType {
    pub fn name(&self) -> &'static str {
        match self {
            AccountType::Native => "native",
            AccountType::Token => "token",
            AccountType::Stake => "stake",
        }
    }
}

const STAKE_FROM_TX_KINDS: &[TxKind] = &[
    TxKind::Transfer,
    TxKind::UpdateAccountInfo,
    TxKind::AddNonceTable,
    TxKind::ResetStake,
    TxKind::DestroyStake,
    TxKind::OpenLending,
    TxKind::CloseLending,
];

const STAKE_TO_TX_KINDS: &[TxKind] = &[
    TxKind::Transfer,
    TxKind::CreateStake,
    TxKind::TakeStake,
    TxKind::WithdrawStake,
    TxKind::UpdateStakeApprover,
    TxKind::Borrow,
    TxKind::Repay,
];

const TOKEN_FROM_TX_KINDS: &[TxKind] = &[
    TxKind::Transfer,
    TxKind::UpdateAccountInfo,
    TxKind::AddNonceTable,
    TxKind::OpenLending,
    TxKind::CloseLending,
];

const TOKEN_TO_TX_KINDS: &[TxKind] = &[TxKind::Transfer, TxKind::Borrow, TxKind::Repay];

/// Kinds that only make sense against a stake pool
const POOL_ONLY_TX_KINDS: &[TxKind] = &[
    TxKind::ResetStake,
    TxKind::DestroyStake,
    TxKind::TakeStake,
    TxKind::WithdrawStake,
    TxKind::UpdateStakeApprover,
];

/// Persisted state of one address
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountData {
    pub id: Address,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub nonce: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub balance: Amount,
    #[serde_as(as = "DisplayFromStr")]
    pub pledge: Amount,
    pub threshold: u16,
    pub keepers: Vec<Address>,
    pub approver: Option<Address>,
    pub approve_list: Option<Vec<TxKind>>,
    #[serde_as(as = "BTreeMap<_, DisplayFromStr>")]
    pub tokens: BTreeMap<TokenSymbol, Amount>,
    pub nonce_table: BTreeMap<u64, Vec<u64>>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub max_total_supply: Option<Amount>,
    pub stake: Option<StakeConfig>,
    pub lending: Option<AccountLending>,
}

impl LedgerSerialize for AccountData {
    fn preferred_encoding() -> EncodingType {
        EncodingType::Bincode // Compact for frequent state persistence
    }
}

impl AccountData {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// True for an account carrying no configuration. Balances and the
    /// nonce are not configuration, so a destroyed pool is empty again.
    pub fn is_empty(&self) -> bool {
        self.account_type == AccountType::Native
            && self.threshold == 0
            && self.keepers.is_empty()
            && self.nonce_table.is_empty()
            && self.approver.is_none()
            && self.approve_list.is_none()
            && self.stake.is_none()
            && self.lending.is_none()
    }

    /// Spendable balance. The pledge is excluded for the native token.
    pub fn balance_of(&self, token: &TokenSymbol) -> Amount {
        if token.is_native() {
            self.balance.clone()
        } else {
            self.tokens.get(token).cloned().unwrap_or_default()
        }
    }

    /// Spendable balance plus pledge (pledge only exists in the native token).
    pub fn balance_of_all(&self, token: &TokenSymbol) -> Amount {
        if token.is_native() {
            &self.balance + &self.pledge
        } else {
            self.balance_of(token)
        }
    }

    pub fn add(&mut self, token: &TokenSymbol, amount: &Amount) {
        if amount.is_zero() {
            return;
        }
        if token.is_native() {
            self.balance += amount;
        } else {
            *self.tokens.entry(token.clone()).or_default() += amount;
        }
    }

    pub fn check_balance(&self, token: &TokenSymbol, amount: &Amount) -> Result<(), AccountError> {
        let available = self.balance_of(token);
        if &available < amount {
            return Err(AccountError::InsufficientBalance {
                token: token.clone(),
                available,
                requested: amount.clone(),
            });
        }
        Ok(())
    }

    pub fn sub(&mut self, token: &TokenSymbol, amount: &Amount) -> Result<(), AccountError> {
        self.check_balance(token, amount)?;
        if amount.is_zero() {
            return Ok(());
        }
        if token.is_native() {
            self.balance -= amount;
        } else if let Some(balance) = self.tokens.get_mut(token) {
            *balance -= amount;
        }
        Ok(())
    }

    pub fn check_balance_with_pledge(&self, amount: &Amount) -> Result<(), AccountError> {
        let available = self.balance_of_all(&TokenSymbol::NATIVE);
        if &available < amount {
            return Err(AccountError::InsufficientBalance {
                token: TokenSymbol::NATIVE,
                available,
                requested: amount.clone(),
            });
        }
        Ok(())
    }

    /// Native debit that falls back on the pledge once the spendable balance
    /// runs out.
    pub fn sub_with_pledge(&mut self, amount: &Amount) -> Result<(), AccountError> {
        self.check_balance_with_pledge(amount)?;
        if &self.balance >= amount {
            self.balance -= amount;
        } else {
            let rest = amount - &self.balance;
            self.balance = Amount::zero();
            self.pledge -= rest;
        }
        Ok(())
    }

    /// Whether `signers` satisfy the keeper threshold and, when it applies to
    /// `kind`, the approver.
    ///
    /// An account without keepers is controlled by its own address.
    pub fn satisfy_signing(&self, kind: TxKind, signers: &Signers) -> bool {
        let keepers_ok = if self.keepers.is_empty() {
            signers.has(&self.id)
        } else {
            signers.count_keepers(&self.keepers) >= self.threshold as usize
        };
        if !keepers_ok {
            return false;
        }

        match &self.approver {
            Some(approver) if self.approver_gates(kind) => signers.has(approver),
            _ => true,
        }
    }

    fn approver_gates(&self, kind: TxKind) -> bool {
        match &self.approve_list {
            Some(list) if !list.is_empty() => list.contains(&kind),
            _ => true,
        }
    }

    /// Keeper threshold check without the approver, for counterparty co-signing.
    pub fn satisfy_keepers(&self, signers: &Signers) -> bool {
        if self.keepers.is_empty() {
            signers.has(&self.id)
        } else {
            signers.count_keepers(&self.keepers) >= self.threshold as usize
        }
    }

    pub fn check_as_from(&self, kind: TxKind) -> Result<(), AccountError> {
        let allowed = match self.account_type {
            AccountType::Native => !matches!(kind, TxKind::ResetStake | TxKind::DestroyStake),
            AccountType::Token => TOKEN_FROM_TX_KINDS.contains(&kind),
            AccountType::Stake => STAKE_FROM_TX_KINDS.contains(&kind),
        };
        if !allowed {
            return Err(AccountError::InvalidTxKind {
                kind,
                account: self.account_type.name(),
            });
        }
        Ok(())
    }

    pub fn check_as_to(&self, kind: TxKind) -> Result<(), AccountError> {
        let allowed = match self.account_type {
            AccountType::Native => {
                kind == TxKind::DestroyStake || !POOL_ONLY_TX_KINDS.contains(&kind)
            }
            AccountType::Token => TOKEN_TO_TX_KINDS.contains(&kind),
            AccountType::Stake => STAKE_TO_TX_KINDS.contains(&kind),
        };
        if !allowed {
            return Err(AccountError::InvalidTxKind {
                kind,
                account: self.account_type.name(),
            });
        }
        Ok(())
    }

    fn purge_nonce_table(&mut self, now: Timestamp) {
        self.nonce_table
            .retain(|&expire, nonces| expire >= now && !nonces.is_empty());
    }
}

/// Mutable state guarded by the account lock
#[derive(Debug)]
pub(crate) struct AccountInner {
    pub(crate) ld: AccountData,
    pub(crate) ledger: Option<AccountLedger>,
}

/// One address's on-chain state, protected by its own lock
#[derive(Debug)]
pub struct Account {
    id: Address,
    inner: Mutex<AccountInner>,
}

impl Account {
    pub fn new(id: Address) -> Self {
        Self::from_data(AccountData::new(id), None)
    }

    pub fn from_data(ld: AccountData, ledger: Option<AccountLedger>) -> Self {
        Self {
            id: ld.id,
            inner: Mutex::new(AccountInner { ld, ledger }),
        }
    }

    pub fn id(&self) -> Address {
        self.id
    }

    /// Read access for getters. Getters never fail; a poisoned lock still
    /// holds the last fully applied state.
    pub(crate) fn read(&self) -> MutexGuard<'_, AccountInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Runs `f` under the account lock, annotating any failure with the
    /// account address and operation name.
    pub(crate) fn mutate<T>(
        &self,
        op: &str,
        f: impl FnOnce(&mut AccountInner) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let context = || format!("Account({}).{}", self.id, op);
        let mut guard = self.inner.lock().with_context(context)?;
        f(&mut guard).with_context(context)
    }

    pub fn account_type(&self) -> AccountType {
        self.read().ld.account_type
    }

    pub fn nonce(&self) -> u64 {
        self.read().ld.nonce
    }

    pub fn balance(&self) -> Amount {
        self.read().ld.balance.clone()
    }

    pub fn pledge(&self) -> Amount {
        self.read().ld.pledge.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.read().ld.is_empty()
    }

    pub fn balance_of(&self, token: &TokenSymbol) -> Amount {
        self.read().ld.balance_of(token)
    }

    pub fn balance_of_all(&self, token: &TokenSymbol) -> Amount {
        self.read().ld.balance_of_all(token)
    }

    pub fn has_ledger(&self) -> bool {
        self.read().ledger.is_some()
    }

    /// Copies of the persisted data and the loaded ledger, if any.
    pub fn snapshot(&self) -> (AccountData, Option<AccountLedger>) {
        let inner = self.read();
        (inner.ld.clone(), inner.ledger.clone())
    }

    pub fn data(&self) -> AccountData {
        self.read().ld.clone()
    }

    pub fn init_ledger(&self, ledger: AccountLedger) -> LedgerResult<()> {
        self.mutate("InitLedger", |inner| {
            if inner.ledger.is_none() {
                inner.ledger = Some(ledger);
            }
            Ok(())
        })
    }

    pub fn add(&self, token: &TokenSymbol, amount: &Amount) -> LedgerResult<()> {
        self.mutate("Add", |inner| {
            inner.ld.add(token, amount);
            Ok(())
        })
    }

    pub fn sub(&self, token: &TokenSymbol, amount: &Amount) -> LedgerResult<()> {
        self.mutate("Sub", |inner| Ok(inner.ld.sub(token, amount)?))
    }

    pub fn check_balance(&self, token: &TokenSymbol, amount: &Amount) -> LedgerResult<()> {
        self.mutate("CheckBalance", |inner| Ok(inner.ld.check_balance(token, amount)?))
    }

    pub fn check_balance_with_pledge(&self, amount: &Amount) -> LedgerResult<()> {
        self.mutate("CheckBalance", |inner| Ok(inner.ld.check_balance_with_pledge(amount)?))
    }

    pub fn sub_with_pledge(&self, amount: &Amount) -> LedgerResult<()> {
        self.mutate("SubWithPledge", |inner| Ok(inner.ld.sub_with_pledge(amount)?))
    }

    /// Moves `amount` of the spendable native balance into the pledge.
    pub fn lock_pledge(&self, amount: &Amount) -> LedgerResult<()> {
        self.mutate("LockPledge", |inner| {
            inner.ld.sub(&TokenSymbol::NATIVE, amount)?;
            inner.ld.pledge += amount;
            Ok(())
        })
    }

    /// Returns the whole pledge to the spendable native balance.
    pub fn release_pledge(&self) -> LedgerResult<Amount> {
        self.mutate("ReleasePledge", |inner| {
            let pledge = std::mem::take(&mut inner.ld.pledge);
            inner.ld.balance += &pledge;
            Ok(pledge)
        })
    }

    pub fn check_nonce(&self, nonce: u64) -> LedgerResult<()> {
        self.mutate("CheckNonce", |inner| {
            if inner.ld.nonce != nonce {
                return Err(AccountError::NonceMismatch {
                    expected: inner.ld.nonce,
                    got: nonce,
                }
                .into());
            }
            Ok(())
        })
    }

    pub fn increment_nonce(&self) -> LedgerResult<()> {
        self.mutate("IncrementNonce", |inner| {
            inner.ld.nonce += 1;
            Ok(())
        })
    }

    pub fn satisfy_signing(&self, kind: TxKind, signers: &Signers) -> bool {
        self.read().ld.satisfy_signing(kind, signers)
    }

    pub fn check_signing(&self, kind: TxKind, signers: &Signers) -> LedgerResult<()> {
        self.mutate("CheckSigning", |inner| {
            if !inner.ld.satisfy_signing(kind, signers) {
                return Err(AccountError::InsufficientSignatures(kind).into());
            }
            Ok(())
        })
    }

    /// Counterparty co-signing check (keepers only).
    pub fn check_keepers_signing(&self, kind: TxKind, signers: &Signers) -> LedgerResult<()> {
        self.mutate("CheckKeepersSigning", |inner| {
            if !inner.ld.satisfy_keepers(signers) {
                return Err(AccountError::InsufficientSignatures(kind).into());
            }
            Ok(())
        })
    }

    pub fn check_as_from(&self, kind: TxKind) -> LedgerResult<()> {
        self.mutate("CheckAsFrom", |inner| Ok(inner.ld.check_as_from(kind)?))
    }

    pub fn check_as_to(&self, kind: TxKind) -> LedgerResult<()> {
        self.mutate("CheckAsTo", |inner| Ok(inner.ld.check_as_to(kind)?))
    }

    /// Replaces the authorization settings. `None` leaves a field unchanged;
    /// a zero approver clears the approver.
    pub fn update_keepers(
        &self,
        threshold: Option<u16>,
        keepers: Option<Vec<Address>>,
        approver: Option<Address>,
        approve_list: Option<Vec<TxKind>>,
    ) -> LedgerResult<()> {
        self.mutate("UpdateKeepers", |inner| {
            let threshold = threshold.unwrap_or(inner.ld.threshold);
            let keepers = keepers.unwrap_or_else(|| inner.ld.keepers.clone());
            ValidationUtils::validate_keepers(threshold, &keepers)?;

            inner.ld.threshold = threshold;
            inner.ld.keepers = keepers;
            if let Some(approver) = approver {
                inner.ld.approver = (!approver.is_zero()).then_some(approver);
            }
            if let Some(list) = approve_list {
                inner.ld.approve_list = (!list.is_empty()).then_some(list);
            }
            Ok(())
        })
    }

    /// Registers pre-authorized one-time nonces that expire at `expire`.
    pub fn add_nonce_table(&self, expire: u64, nonces: &[u64], now: Timestamp) -> LedgerResult<()> {
        self.mutate("AddNonceTable", |inner| {
            if expire <= now || expire > now + MAX_NONCE_TABLE_EXPIRE {
                return Err(LedgerError::validation(format!(
                    "invalid expire, expected > {} and <= {}, got {}",
                    now,
                    now + MAX_NONCE_TABLE_EXPIRE,
                    expire
                )));
            }

            let mut merged = inner.ld.nonce_table.get(&expire).cloned().unwrap_or_default();
            merged.extend_from_slice(nonces);
            merged.sort_unstable();
            merged.dedup();
            if merged.len() > MAX_NONCES_PER_SLOT {
                return Err(LedgerError::validation(format!(
                    "too many nonces at {}, expected <= {}, got {}",
                    expire,
                    MAX_NONCES_PER_SLOT,
                    merged.len()
                )));
            }

            inner.ld.purge_nonce_table(now);
            inner.ld.nonce_table.insert(expire, merged);
            Ok(())
        })
    }

    /// Consumes one pre-authorized nonce instead of the sequential nonce.
    pub fn consume_nonce(&self, expire: u64, nonce: u64, now: Timestamp) -> LedgerResult<()> {
        self.mutate("ConsumeNonce", |inner| {
            if expire < now {
                return Err(AccountError::NonceExpired(expire).into());
            }
            let not_found = AccountError::NonceNotFound { expire, nonce };
            let slot = inner.ld.nonce_table.get_mut(&expire).ok_or(not_found.clone())?;
            let pos = slot.binary_search(&nonce).map_err(|_| not_found)?;
            slot.remove(pos);
            inner.ld.purge_nonce_table(now);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldc_common::types::ADDRESS_SIZE;

    fn addr(b: u8) -> Address {
        Address::new([b; ADDRESS_SIZE])
    }

    fn usd() -> TokenSymbol {
        "$USD".parse().unwrap()
    }

    #[test]
    fn test_balance_ledger() {
        let acc = Account::new(addr(1));
        acc.add(&TokenSymbol::NATIVE, &ldc(10)).unwrap();
        acc.add(&usd(), &Amount::from(5u64)).unwrap();

        assert_eq!(acc.balance_of(&TokenSymbol::NATIVE), ldc(10));
        assert_eq!(acc.balance_of(&usd()), Amount::from(5u64));

        acc.sub(&usd(), &Amount::from(5u64)).unwrap();
        assert!(acc.balance_of(&usd()).is_zero());

        let err = acc.sub(&TokenSymbol::NATIVE, &ldc(11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(acc.balance(), ldc(10));
    }

    #[test]
    fn test_pledge_excluded_from_spendable() {
        let acc = Account::new(addr(1));
        acc.add(&TokenSymbol::NATIVE, &ldc(10)).unwrap();
        acc.lock_pledge(&ldc(4)).unwrap();

        assert_eq!(acc.balance_of(&TokenSymbol::NATIVE), ldc(6));
        assert_eq!(acc.balance_of_all(&TokenSymbol::NATIVE), ldc(10));
        assert!(acc.check_balance(&TokenSymbol::NATIVE, &ldc(7)).is_err());

        assert_eq!(acc.release_pledge().unwrap(), ldc(4));
        assert_eq!(acc.balance(), ldc(10));
        assert!(acc.pledge().is_zero());
    }

    #[test]
    fn test_sub_with_pledge_drains_balance_first() {
        let acc = Account::new(addr(1));
        acc.add(&TokenSymbol::NATIVE, &ldc(10)).unwrap();
        acc.lock_pledge(&ldc(8)).unwrap();

        acc.check_balance_with_pledge(&ldc(10)).unwrap();
        let err = acc.check_balance_with_pledge(&ldc(11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(acc.pledge(), ldc(8));

        acc.sub_with_pledge(&ldc(3)).unwrap();
        assert_eq!(acc.balance(), Amount::zero());
        assert_eq!(acc.pledge(), ldc(7));
        assert!(acc.sub_with_pledge(&ldc(8)).is_err());
        assert_eq!(acc.pledge(), ldc(7));
    }

    #[test]
    fn test_nonce_checks() {
        let acc = Account::new(addr(1));
        acc.check_nonce(0).unwrap();
        acc.increment_nonce().unwrap();
        let err = acc.check_nonce(0).unwrap_err();
        assert_eq!(
            err.account_error(),
            Some(&AccountError::NonceMismatch { expected: 1, got: 0 })
        );
    }

    #[test]
    fn test_signing_without_keepers_uses_own_address() {
        let acc = Account::new(addr(1));
        assert!(acc.satisfy_signing(TxKind::Transfer, &Signers::new(vec![addr(1)])));
        assert!(!acc.satisfy_signing(TxKind::Transfer, &Signers::new(vec![addr(2)])));
    }

    #[test]
    fn test_threshold_and_approver() {
        let acc = Account::new(addr(1));
        acc.update_keepers(
            Some(2),
            Some(vec![addr(2), addr(3), addr(4)]),
            Some(addr(9)),
            Some(vec![TxKind::Transfer]),
        )
        .unwrap();

        // approver gates Transfer only
        assert!(!acc.satisfy_signing(TxKind::Transfer, &Signers::new(vec![addr(2), addr(3)])));
        assert!(acc.satisfy_signing(
            TxKind::Transfer,
            &Signers::new(vec![addr(2), addr(3), addr(9)])
        ));
        assert!(acc.satisfy_signing(TxKind::AddNonceTable, &Signers::new(vec![addr(2), addr(4)])));
        assert!(!acc.satisfy_signing(TxKind::AddNonceTable, &Signers::new(vec![addr(2), addr(9)])));

        // empty approve list gates everything
        acc.update_keepers(None, None, None, Some(vec![])).unwrap();
        assert!(acc.data().approve_list.is_none());
        assert!(!acc.satisfy_signing(TxKind::AddNonceTable, &Signers::new(vec![addr(2), addr(4)])));

        // zero approver clears it
        acc.update_keepers(None, None, Some(Address::ZERO), None).unwrap();
        assert!(acc.satisfy_signing(TxKind::Transfer, &Signers::new(vec![addr(2), addr(3)])));

        let err = acc
            .check_signing(TxKind::Transfer, &Signers::new(vec![addr(2)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationFailure);
    }

    #[test]
    fn test_update_keepers_rejects_bad_threshold() {
        let acc = Account::new(addr(1));
        assert!(acc.update_keepers(Some(3), Some(vec![addr(2)]), None, None).is_err());
        assert!(acc.data().keepers.is_empty());
    }

    #[test]
    fn test_tx_kind_gating() {
        let mut ld = AccountData::new(addr(1));
        assert!(ld.check_as_from(TxKind::Transfer).is_ok());
        assert!(ld.check_as_from(TxKind::ResetStake).is_err());
        assert!(ld.check_as_to(TxKind::CreateStake).is_ok());
        assert!(ld.check_as_to(TxKind::TakeStake).is_err());

        ld.account_type = AccountType::Stake;
        assert!(ld.check_as_from(TxKind::ResetStake).is_ok());
        assert!(ld.check_as_from(TxKind::Borrow).is_err());
        assert!(ld.check_as_to(TxKind::TakeStake).is_ok());
        let err = ld.check_as_from(TxKind::TakeStake).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccountType);
    }

    #[test]
    fn test_nonce_table() {
        let acc = Account::new(addr(1));
        let now = 1_700_000_000;

        acc.add_nonce_table(now + 100, &[3, 1, 2], now).unwrap();
        acc.add_nonce_table(now + 100, &[2, 4], now).unwrap();
        assert_eq!(acc.data().nonce_table[&(now + 100)], vec![1, 2, 3, 4]);

        assert!(acc.add_nonce_table(now, &[1], now).is_err());
        assert!(acc
            .add_nonce_table(now + MAX_NONCE_TABLE_EXPIRE + 1, &[1], now)
            .is_err());

        acc.consume_nonce(now + 100, 2, now).unwrap();
        let err = acc.consume_nonce(now + 100, 2, now).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = acc.consume_nonce(now + 100, 1, now + 101).unwrap_err();
        assert_eq!(err.account_error(), Some(&AccountError::NonceExpired(now + 100)));
    }

    #[test]
    fn test_nonce_table_purges_expired_slots() {
        let acc = Account::new(addr(1));
        let now = 1_700_000_000;
        acc.add_nonce_table(now + 10, &[1], now).unwrap();
        acc.add_nonce_table(now + 100, &[1], now + 20).unwrap();
        let table = acc.data().nonce_table;
        assert_eq!(table.len(), 1);
        assert!(table.contains_key(&(now + 100)));
    }

    #[test]
    fn test_account_data_roundtrip() {
        let acc = Account::new(addr(1));
        acc.add(&TokenSymbol::NATIVE, &ldc(3)).unwrap();
        acc.add(&usd(), &Amount::from(7u64)).unwrap();
        let data = acc.data();

        let decoded = AccountData::decode(&data.encode().unwrap()).unwrap();
        assert_eq!(decoded, data);

        let json = data.encode_as(EncodingType::Json).unwrap();
        let decoded = AccountData::decode_as(&json, EncodingType::Json).unwrap();
        assert_eq!(decoded, data);
    }
}
