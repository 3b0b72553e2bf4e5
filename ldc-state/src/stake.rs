//! Staking sub-ledger of stake pool accounts.
//!
//! A stake pool keeps one [`StakeEntry`] per staker. Whatever the pool holds
//! beyond the sum of all entries is undistributed bonus; it is handed out
//! proportionally to the entries before any entry changes, so the result of
//! each operation never depends on how often bonus was allocated before.

use ldc_common::prelude::*;
use ldc_common::types::units::PPM;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::collections::BTreeMap;
use tracing::debug;

use crate::account::{Account, AccountData, AccountInner, AccountType};

/// Stake pool parameters
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeConfig {
    /// Token staked in this pool, immutable after creation
    pub token: TokenSymbol,

    /// Pool type tag, immutable after creation
    #[serde(rename = "type")]
    pub stake_type: u16,

    /// Unix seconds before which the pool is locked, 0 for none
    pub lock_time: u64,

    /// Withdraw fee in parts per million
    pub withdraw_fee: u64,

    /// Minimum amount of a single TakeStake
    #[serde_as(as = "DisplayFromStr")]
    pub min_amount: Amount,

    /// Maximum stake (including bonus) one staker may hold
    #[serde_as(as = "DisplayFromStr")]
    pub max_amount: Amount,
}

impl StakeConfig {
    pub fn syntactic_verify(&self) -> LedgerResult<()> {
        ValidationUtils::validate_ppm(self.withdraw_fee, "withdraw_fee")?;
        if !self.max_amount.is_zero() && self.min_amount > self.max_amount {
            return Err(LedgerError::validation(format!(
                "invalid maxAmount, expected >= {}, got {}",
                self.min_amount, self.max_amount
            )));
        }
        Ok(())
    }
}

/// A staker's position in a pool
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeEntry {
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    pub lock_time: u64,
    pub approver: Option<Address>,
}

/// Staking sub-ledger: staker address to entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedger {
    pub stake: BTreeMap<Address, StakeEntry>,
}

impl LedgerSerialize for AccountLedger {
    fn preferred_encoding() -> EncodingType {
        EncodingType::Bincode
    }
}

impl AccountLedger {
    pub fn is_empty(&self) -> bool {
        self.stake.is_empty()
    }

    fn total(&self) -> Amount {
        self.stake.values().map(|e| &e.amount).sum()
    }

    /// Number of entries with a positive amount.
    pub fn holders(&self) -> usize {
        self.stake.values().filter(|e| !e.amount.is_zero()).count()
    }
}

/// Ratio of undistributed surplus to the total staked, kept as an exact
/// fraction `alloc / total`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BonusRate {
    alloc: Amount,
    total: Amount,
}

impl BonusRate {
    pub fn is_zero(&self) -> bool {
        self.alloc.is_zero() || self.total.is_zero()
    }

    /// Bonus owed to a position of `amount`, rounded down.
    pub fn bonus_of(&self, amount: &Amount) -> Amount {
        if self.is_zero() {
            return Amount::zero();
        }
        amount * &self.alloc / &self.total
    }

    /// Computes the rate from the pool's full balance and its entries.
    pub fn compute(ld: &AccountData, ledger: &AccountLedger, token: &TokenSymbol) -> Self {
        let total = ledger.total();
        if total.is_zero() {
            return Self::default();
        }
        let balance = ld.balance_of_all(token);
        if balance <= total {
            return Self::default();
        }
        Self {
            alloc: balance - &total,
            total,
        }
    }

    /// Credits each entry with its bonus.
    fn allocate(&self, ledger: &mut AccountLedger) {
        if self.is_zero() {
            return;
        }
        for entry in ledger.stake.values_mut() {
            let bonus = self.bonus_of(&entry.amount);
            entry.amount += bonus;
        }
    }
}

/// Settings applied to the pool account itself at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakeAccountInfo {
    pub threshold: u16,
    pub keepers: Vec<Address>,
    pub approver: Option<Address>,
    pub approve_list: Option<Vec<TxKind>>,
}

fn is_locked(lock_time: u64, now: Timestamp) -> bool {
    lock_time > 0 && lock_time >= now
}

/// Splits the guarded state into the pool config, account data and ledger,
/// failing unless this is a stake account.
fn stake_parts(
    inner: &mut AccountInner,
) -> Result<(StakeConfig, &mut AccountData, &mut AccountLedger), AccountError> {
    let AccountInner { ld, ledger } = inner;
    let cfg = match (&ld.account_type, &ld.stake) {
        (AccountType::Stake, Some(cfg)) => cfg.clone(),
        _ => return Err(AccountError::InvalidStakeAccount),
    };
    let ledger = ledger.as_mut().ok_or(AccountError::InvalidLedger)?;
    Ok((cfg, ld, ledger))
}

impl Account {
    pub fn stake_config(&self) -> Option<StakeConfig> {
        self.read().ld.stake.clone()
    }

    pub fn stake_entry(&self, staker: &Address) -> Option<StakeEntry> {
        self.read()
            .ledger
            .as_ref()
            .and_then(|l| l.stake.get(staker).cloned())
    }

    pub fn ledger(&self) -> Option<AccountLedger> {
        self.read().ledger.clone()
    }

    /// Current undistributed bonus rate of the pool, zero for other accounts.
    pub fn stake_bonus_rate(&self) -> BonusRate {
        let inner = self.read();
        match (&inner.ld.stake, &inner.ledger) {
            (Some(cfg), Some(ledger)) => BonusRate::compute(&inner.ld, ledger, &cfg.token),
            _ => BonusRate::default(),
        }
    }

    /// Turns an empty account at a stake-symbol address into a stake pool.
    ///
    /// `pledge` is the amount the creator transferred. For a native-token pool
    /// the creator holds it as the first stake entry.
    pub fn create_stake(
        &self,
        creator: &Address,
        pledge: &Amount,
        min_pledge: &Amount,
        acc: &StakeAccountInfo,
        cfg: &StakeConfig,
        now: Timestamp,
    ) -> LedgerResult<()> {
        self.mutate("CreateStake", |inner| {
            if self.id().as_stake_symbol().is_none() {
                return Err(AccountError::InvalidStakeAccount.into());
            }
            if !inner.ld.is_empty() {
                return Err(AccountError::StakeAccountExists.into());
            }
            cfg.syntactic_verify()?;
            if cfg.max_amount.is_zero() {
                return Err(LedgerError::validation("invalid maxAmount, expected > 0"));
            }
            ValidationUtils::validate_lock_time(cfg.lock_time, now)?;
            if pledge < min_pledge {
                return Err(AccountError::PledgeBelowMinimum {
                    min: min_pledge.clone(),
                    got: pledge.clone(),
                }
                .into());
            }
            ValidationUtils::validate_keepers(acc.threshold, &acc.keepers)?;
            let ledger = inner.ledger.as_mut().ok_or(AccountError::InvalidLedger)?;

            let ld = &mut inner.ld;
            ld.account_type = AccountType::Stake;
            ld.threshold = acc.threshold;
            ld.keepers = acc.keepers.clone();
            ld.approver = acc.approver.filter(|a| !a.is_zero());
            ld.approve_list = acc.approve_list.clone().filter(|l| !l.is_empty());
            ld.max_total_supply = None;
            ld.stake = Some(cfg.clone());

            if cfg.token.is_native() {
                ledger.stake.insert(
                    *creator,
                    StakeEntry {
                        amount: pledge.clone(),
                        ..Default::default()
                    },
                );
            } else {
                ld.tokens.entry(cfg.token.clone()).or_default();
            }
            Ok(())
        })
    }

    /// Updates lock time, withdraw fee and, when positive, min/max amounts.
    pub fn reset_stake(&self, cfg: &StakeConfig, now: Timestamp) -> LedgerResult<()> {
        self.mutate("ResetStake", |inner| {
            let (current, ld, ledger) = stake_parts(inner)?;
            if cfg.stake_type != current.stake_type {
                return Err(AccountError::StakeTypeImmutable {
                    expected: current.stake_type,
                    got: cfg.stake_type,
                }
                .into());
            }
            if cfg.token != current.token {
                return Err(AccountError::StakeTokenImmutable {
                    expected: current.token,
                    got: cfg.token.clone(),
                }
                .into());
            }

            let holders = ledger.holders();
            if holders > 1 {
                return Err(AccountError::TooManyHolders(holders).into());
            }
            if is_locked(current.lock_time, now) {
                return Err(AccountError::StakeLocked(current.lock_time).into());
            }

            cfg.syntactic_verify()?;
            ValidationUtils::validate_lock_time(cfg.lock_time, now)?;

            let mut next = current;
            next.lock_time = cfg.lock_time;
            next.withdraw_fee = cfg.withdraw_fee;
            if !cfg.min_amount.is_zero() {
                next.min_amount = cfg.min_amount.clone();
            }
            if !cfg.max_amount.is_zero() {
                next.max_amount = cfg.max_amount.clone();
            }
            next.syntactic_verify()?;

            ld.stake = Some(next);
            Ok(())
        })
    }

    /// Dissolves the pool back into a plain account.
    ///
    /// Returns the balances the pool held, which the caller credits to
    /// `recipient`. The pledge should already be released by the caller.
    pub fn destroy_stake(
        &self,
        recipient: &Address,
        now: Timestamp,
    ) -> LedgerResult<Vec<(TokenSymbol, Amount)>> {
        self.mutate("DestroyStake", |inner| {
            let (cfg, ld, ledger) = stake_parts(inner)?;
            if is_locked(cfg.lock_time, now) {
                return Err(AccountError::StakeLocked(cfg.lock_time).into());
            }

            let mut holders = ledger.stake.iter().filter(|(_, e)| !e.amount.is_zero());
            match (holders.next(), holders.next()) {
                (Some(_), Some(_)) => {
                    return Err(AccountError::LedgerNotEmpty(ledger.holders()).into());
                }
                (Some((holder, _)), None) if holder != recipient => {
                    return Err(AccountError::RecipientMismatch {
                        expected: *holder,
                        got: *recipient,
                    }
                    .into());
                }
                _ => {}
            }
            if let Some(lending) = &ld.lending {
                if !lending.entries.is_empty() {
                    return Err(AccountError::LendingNotClosed(lending.entries.len()).into());
                }
            }

            let mut payout = Vec::new();
            let native = std::mem::take(&mut ld.balance) + std::mem::take(&mut ld.pledge);
            if !native.is_zero() {
                payout.push((TokenSymbol::NATIVE, native));
            }
            if let Some(amount) = ld.tokens.remove(&cfg.token) {
                if !amount.is_zero() {
                    payout.push((cfg.token.clone(), amount));
                }
            }

            ld.account_type = AccountType::Native;
            ld.threshold = 0;
            ld.keepers.clear();
            ld.approver = None;
            ld.approve_list = None;
            ld.nonce_table.clear();
            ld.max_total_supply = None;
            ld.stake = None;
            ld.lending = None;
            *ledger = AccountLedger::default();
            Ok(payout)
        })
    }

    /// Records a deposit of `amount` by `staker`. Must run before the deposit
    /// is credited to the pool, otherwise it would count as surplus.
    pub fn take_stake(
        &self,
        token: &TokenSymbol,
        staker: &Address,
        amount: &Amount,
        lock_time: u64,
    ) -> LedgerResult<()> {
        self.mutate("TakeStake", |inner| {
            let (cfg, ld, ledger) = stake_parts(inner)?;
            if token != &cfg.token {
                return Err(AccountError::InvalidToken {
                    expected: cfg.token,
                    got: token.clone(),
                }
                .into());
            }
            if amount < &cfg.min_amount {
                return Err(AccountError::AmountBelowMinimum {
                    min: cfg.min_amount,
                    got: amount.clone(),
                }
                .into());
            }
            if lock_time > 0 && lock_time <= cfg.lock_time {
                return Err(AccountError::LockTimeNotAfterPoolLock {
                    pool: cfg.lock_time,
                    got: lock_time,
                }
                .into());
            }

            let rate = BonusRate::compute(ld, ledger, &cfg.token);
            let held = ledger
                .stake
                .get(staker)
                .map(|e| &e.amount + rate.bonus_of(&e.amount))
                .unwrap_or_default();
            let total = held + amount;
            if total > cfg.max_amount {
                return Err(AccountError::AmountAboveMaximum {
                    max: cfg.max_amount,
                    got: total,
                }
                .into());
            }

            rate.allocate(ledger);
            let entry = ledger.stake.entry(*staker).or_default();
            entry.amount += amount;
            entry.lock_time = entry.lock_time.max(lock_time);
            debug!(pool = %self.id(), %staker, amount = %entry.amount, "stake taken");
            Ok(())
        })
    }

    /// Reduces `staker`'s position by `amount` and returns the amount the
    /// staker receives after the withdraw fee. The caller moves that amount
    /// out of the pool; the fee stays in the pool as surplus.
    pub fn withdraw_stake(
        &self,
        token: &TokenSymbol,
        staker: &Address,
        signers: &Signers,
        amount: &Amount,
        now: Timestamp,
    ) -> LedgerResult<Amount> {
        self.mutate("WithdrawStake", |inner| {
            let (cfg, ld, ledger) = stake_parts(inner)?;
            if token != &cfg.token {
                return Err(AccountError::InvalidToken {
                    expected: cfg.token,
                    got: token.clone(),
                }
                .into());
            }
            if is_locked(cfg.lock_time, now) {
                return Err(AccountError::StakeLocked(cfg.lock_time).into());
            }

            let rate = BonusRate::compute(ld, ledger, &cfg.token);
            let entry = ledger
                .stake
                .get(staker)
                .ok_or(AccountError::NoStakeEntry(*staker))?;
            if is_locked(entry.lock_time, now) {
                return Err(AccountError::EntryLocked(entry.lock_time).into());
            }
            if let Some(approver) = &entry.approver {
                if !signers.has(approver) {
                    return Err(AccountError::ApproverSignatureRequired(*approver).into());
                }
            }

            let available = &entry.amount + rate.bonus_of(&entry.amount);
            if &available < amount {
                return Err(AccountError::InsufficientStake {
                    available,
                    requested: amount.clone(),
                }
                .into());
            }
            let pool_balance = ld.balance_of(&cfg.token);
            if &pool_balance < amount {
                return Err(AccountError::InsufficientPoolBalance {
                    available: pool_balance,
                    requested: amount.clone(),
                }
                .into());
            }

            rate.allocate(ledger);
            if let Some(entry) = ledger.stake.get_mut(staker) {
                entry.amount -= amount;
                if entry.amount.is_zero() && entry.approver.is_none() {
                    ledger.stake.remove(staker);
                }
            }

            let fee = amount * Amount::from(cfg.withdraw_fee) / Amount::from(PPM);
            Ok(amount - fee)
        })
    }

    /// Sets or clears (zero address) the approver of `staker`'s entry. The
    /// current approver must be among the signers.
    pub fn update_stake_approver(
        &self,
        staker: &Address,
        approver: &Address,
        signers: &Signers,
    ) -> LedgerResult<()> {
        self.mutate("UpdateStakeApprover", |inner| {
            let (_, _, ledger) = stake_parts(inner)?;
            let entry = ledger
                .stake
                .get_mut(staker)
                .ok_or(AccountError::NoStakeEntry(*staker))?;
            if let Some(current) = &entry.approver {
                if !signers.has(current) {
                    return Err(AccountError::ApproverSignatureRequired(*current).into());
                }
            }

            entry.approver = (!approver.is_zero()).then_some(*approver);
            if entry.amount.is_zero() && entry.approver.is_none() {
                ledger.stake.remove(staker);
            }
            Ok(())
        })
    }

    /// Entry amount plus its share of the current surplus. Zero for a wrong
    /// token, a missing entry or a non-stake account.
    pub fn get_stake_amount(&self, token: &TokenSymbol, staker: &Address) -> Amount {
        let inner = self.read();
        let (Some(cfg), Some(ledger)) = (&inner.ld.stake, &inner.ledger) else {
            return Amount::zero();
        };
        if inner.ld.account_type != AccountType::Stake || &cfg.token != token {
            return Amount::zero();
        }
        match ledger.stake.get(staker) {
            Some(entry) => {
                let rate = BonusRate::compute(&inner.ld, ledger, &cfg.token);
                &entry.amount + rate.bonus_of(&entry.amount)
            }
            None => Amount::zero(),
        }
    }
}
