//! Lending book of an account: open/close, borrow and repay with simple
//! daily interest.

use ldc_common::prelude::*;
use ldc_common::types::units::PPM;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::collections::BTreeMap;

use crate::account::Account;

const SECONDS_PER_DAY: u64 = 86_400;

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingConfig {
    pub token: TokenSymbol,
    /// Interest per day before the due time, in parts per million
    pub daily_interest: u64,
    /// Interest per day after the due time, in parts per million
    pub overdue_interest: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub min_amount: Amount,
    #[serde_as(as = "DisplayFromStr")]
    pub max_amount: Amount,
}

impl LendingConfig {
    pub fn syntactic_verify(&self) -> LedgerResult<()> {
        ValidationUtils::validate_ppm(self.daily_interest, "daily_interest")?;
        ValidationUtils::validate_ppm(self.overdue_interest, "overdue_interest")?;
        if self.max_amount.is_zero() || self.min_amount > self.max_amount {
            return Err(LedgerError::validation(format!(
                "invalid maxAmount, expected > 0 and >= {}, got {}",
                self.min_amount, self.max_amount
            )));
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingEntry {
    /// Outstanding principal plus interest accrued up to `update_at`
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    pub update_at: u64,
    /// 0 for no due time
    pub due_time: u64,
}

impl LendingEntry {
    /// Amount owed at `now`, rounded down.
    pub fn owed(&self, cfg: &LendingConfig, now: Timestamp) -> Amount {
        if now <= self.update_at {
            return self.amount.clone();
        }
        let (regular, overdue) = if self.due_time == 0 || now <= self.due_time {
            (now - self.update_at, 0)
        } else if self.update_at >= self.due_time {
            (0, now - self.update_at)
        } else {
            (self.due_time - self.update_at, now - self.due_time)
        };

        let rate_seconds = Amount::from(regular) * cfg.daily_interest
            + Amount::from(overdue) * cfg.overdue_interest;
        let interest = &self.amount * rate_seconds / (Amount::from(PPM) * SECONDS_PER_DAY);
        &self.amount + interest
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLending {
    pub config: LendingConfig,
    pub entries: BTreeMap<Address, LendingEntry>,
}

impl Account {
    pub fn lending(&self) -> Option<AccountLending> {
        self.read().ld.lending.clone()
    }

    pub fn open_lending(&self, cfg: &LendingConfig) -> LedgerResult<()> {
        self.mutate("OpenLending", |inner| {
            if inner.ld.lending.is_some() {
                return Err(AccountError::LendingExists.into());
            }
            cfg.syntactic_verify()?;
            inner.ld.lending = Some(AccountLending {
                config: cfg.clone(),
                entries: BTreeMap::new(),
            });
            Ok(())
        })
    }

    pub fn close_lending(&self) -> LedgerResult<()> {
        self.mutate("CloseLending", |inner| {
            let lending = inner.ld.lending.as_ref().ok_or(AccountError::LendingNotOpened)?;
            if !lending.entries.is_empty() {
                return Err(AccountError::LendingNotClosed(lending.entries.len()).into());
            }
            inner.ld.lending = None;
            Ok(())
        })
    }

    /// Records a loan of `amount` to `borrower`. The caller moves the funds.
    pub fn borrow(
        &self,
        token: &TokenSymbol,
        borrower: &Address,
        amount: &Amount,
        due_time: u64,
        now: Timestamp,
    ) -> LedgerResult<()> {
        self.mutate("Borrow", |inner| {
            let ld = &mut inner.ld;
            let lending = ld.lending.as_ref().ok_or(AccountError::LendingNotOpened)?;
            let cfg = &lending.config;
            if token != &cfg.token {
                return Err(AccountError::InvalidToken {
                    expected: cfg.token.clone(),
                    got: token.clone(),
                }
                .into());
            }
            ValidationUtils::validate_lock_time(due_time, now)?;
            if amount < &cfg.min_amount {
                return Err(AccountError::AmountBelowMinimum {
                    min: cfg.min_amount.clone(),
                    got: amount.clone(),
                }
                .into());
            }
            let owed = lending
                .entries
                .get(borrower)
                .map(|e| e.owed(cfg, now))
                .unwrap_or_default();
            let total = owed + amount;
            if total > cfg.max_amount {
                return Err(AccountError::AmountAboveMaximum {
                    max: cfg.max_amount.clone(),
                    got: total,
                }
                .into());
            }
            ld.check_balance(token, amount)?;

            if let Some(lending) = ld.lending.as_mut() {
                let entry = lending.entries.entry(*borrower).or_default();
                entry.amount = total;
                entry.update_at = now;
                if due_time > 0 {
                    entry.due_time = due_time;
                }
            }
            Ok(())
        })
    }

    /// Settles up to `amount` of `borrower`'s debt and returns the amount
    /// actually repaid. The caller moves that amount.
    pub fn repay(
        &self,
        token: &TokenSymbol,
        borrower: &Address,
        amount: &Amount,
        now: Timestamp,
    ) -> LedgerResult<Amount> {
        self.mutate("Repay", |inner| {
            let lending = inner
                .ld
                .lending
                .as_mut()
                .ok_or(AccountError::LendingNotOpened)?;
            if token != &lending.config.token {
                return Err(AccountError::InvalidToken {
                    expected: lending.config.token.clone(),
                    got: token.clone(),
                }
                .into());
            }
            let entry = lending
                .entries
                .get(borrower)
                .ok_or(AccountError::NoLendingEntry(*borrower))?;

            let owed = entry.owed(&lending.config, now);
            let actual = std::cmp::min(amount, &owed).clone();
            let remaining = owed - &actual;
            if remaining.is_zero() {
                lending.entries.remove(borrower);
            } else if let Some(entry) = lending.entries.get_mut(borrower) {
                entry.amount = remaining;
                entry.update_at = now;
            }
            Ok(actual)
        })
    }
}
