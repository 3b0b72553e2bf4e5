//! Staking transactions.
//!
//! The pool account is the recipient of CreateStake, TakeStake,
//! WithdrawStake and UpdateStakeApprover, and the sender of ResetStake and
//! DestroyStake. Each handler loads the pool's stake ledger before touching
//! it; balance movements between pool and staker are done here, around the
//! ledger bookkeeping done by the pool account.

use ldc_common::prelude::*;
use ldc_state::{ChainState, StakeAccountInfo, StakeConfig};
use num_traits::Zero;
use tracing::{debug, info};

use crate::base::TxBase;
use crate::context::ChainContext;
use crate::txhandler::TxHandler;
use crate::types::{
    ResetStakeInput, TakeStakeInput, TxAccounter, UpdateStakeApproverInput, WithdrawStakeInput,
};

pub struct TxCreateStake {
    base: TxBase,
    info: StakeAccountInfo,
    cfg: StakeConfig,
}

impl TxCreateStake {
    pub fn new(base: TxBase) -> Self {
        Self {
            base,
            info: StakeAccountInfo::default(),
            cfg: StakeConfig::default(),
        }
    }
}

impl TxHandler for TxCreateStake {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        let to = self.base.require_to()?;
        self.base.require_amount()?;
        if !self.base.tx.token.is_native() {
            return Err(LedgerError::validation(format!(
                "CreateStake: pledge must be paid in LDC, got {}",
                self.base.tx.token
            )));
        }
        if to.as_stake_symbol().is_none() {
            return Err(AccountError::InvalidStakeAccount.into());
        }

        let input: TxAccounter = self.base.tx.decode_data()?;
        input.syntactic_verify()?;
        let (threshold, keepers) = match (input.threshold, input.keepers) {
            (Some(threshold), Some(keepers)) if !keepers.is_empty() => (threshold, keepers),
            _ => {
                return Err(LedgerError::validation(
                    "CreateStake: threshold and keepers required",
                ))
            }
        };
        self.cfg = input
            .stake
            .ok_or_else(|| LedgerError::validation("CreateStake: missing stake config"))?;
        self.info = StakeAccountInfo {
            threshold,
            keepers,
            approver: input.approver,
            approve_list: input.approve_list,
        };
        Ok(())
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let tx = &self.base.tx;
        let pool = self.base.recipient()?;
        cs.load_ledger(&pool)?;

        let min_pledge = ctx.fee_config().min_stake_pledge();
        pool.create_stake(
            &tx.from,
            &self.base.amount,
            &min_pledge,
            &self.info,
            &self.cfg,
            tx.timestamp,
        )?;
        self.base.accept()?;
        pool.lock_pledge(&min_pledge)?;

        info!(pool = %pool.id(), creator = %tx.from, token = %self.cfg.token, "stake pool created");
        Ok(())
    }
}

pub struct TxResetStake {
    base: TxBase,
    cfg: ResetStakeInput,
}

impl TxResetStake {
    pub fn new(base: TxBase) -> Self {
        Self {
            base,
            cfg: StakeConfig::default(),
        }
    }
}

impl TxHandler for TxResetStake {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.forbid_to()?;
        self.base.forbid_amount()?;
        let cfg: ResetStakeInput = self.base.tx.decode_data()?;
        cfg.syntactic_verify()?;
        self.cfg = cfg;
        Ok(())
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let pool = self.base.sender()?;
        cs.load_ledger(&pool)?;
        pool.reset_stake(&self.cfg, self.base.tx.timestamp)?;
        self.base.accept()?;
        debug!(pool = %pool.id(), lock_time = self.cfg.lock_time, "stake pool reset");
        Ok(())
    }
}

pub struct TxDestroyStake {
    base: TxBase,
}

impl TxDestroyStake {
    pub fn new(base: TxBase) -> Self {
        Self {
            base: base.with_pledge_for_gas(),
        }
    }
}

impl TxHandler for TxDestroyStake {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.require_to()?;
        self.base.forbid_amount()?;
        self.base.forbid_data()
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let pool = self.base.sender()?;
        let recipient = self.base.recipient()?;
        cs.load_ledger(&pool)?;

        self.base.accept()?;
        pool.release_pledge()?;
        let payout = pool.destroy_stake(&recipient.id(), self.base.tx.timestamp)?;
        for (token, amount) in &payout {
            recipient.add(token, amount)?;
        }

        info!(pool = %pool.id(), recipient = %recipient.id(), "stake pool destroyed");
        Ok(())
    }
}

pub struct TxTakeStake {
    base: TxBase,
    input: TakeStakeInput,
}

impl TxTakeStake {
    pub fn new(base: TxBase) -> Self {
        Self {
            base,
            input: TakeStakeInput::default(),
        }
    }
}

impl TxHandler for TxTakeStake {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.require_to()?;
        self.base.require_amount()?;
        if !self.base.tx.data.is_empty() {
            self.input = self.base.tx.decode_data()?;
        }
        Ok(())
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let tx = &self.base.tx;
        let pool = self.base.recipient()?;
        cs.load_ledger(&pool)?;

        // the pool controls admission
        pool.check_keepers_signing(tx.kind, &tx.ex_signers)?;
        pool.take_stake(&tx.token, &tx.from, &self.base.amount, self.input.lock_time)?;
        self.base.accept()?;

        debug!(pool = %pool.id(), staker = %tx.from, amount = %self.base.amount, "stake taken");
        Ok(())
    }
}

pub struct TxWithdrawStake {
    base: TxBase,
    amount: Amount,
}

impl TxWithdrawStake {
    pub fn new(base: TxBase) -> Self {
        Self {
            base,
            amount: Amount::zero(),
        }
    }
}

impl TxHandler for TxWithdrawStake {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.require_to()?;
        self.base.forbid_amount()?;
        let input: WithdrawStakeInput = self.base.tx.decode_data()?;
        if input.amount.is_zero() {
            return Err(LedgerError::validation("WithdrawStake: invalid amount 0"));
        }
        self.amount = input.amount;
        Ok(())
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let tx = &self.base.tx;
        let staker = self.base.sender()?;
        let pool = self.base.recipient()?;
        cs.load_ledger(&pool)?;

        let net = pool.withdraw_stake(&tx.token, &tx.from, &tx.signers, &self.amount, tx.timestamp)?;
        self.base.accept()?;
        pool.sub(&tx.token, &net)?;
        staker.add(&tx.token, &net)?;

        debug!(pool = %pool.id(), staker = %tx.from, amount = %self.amount, net = %net, "stake withdrawn");
        Ok(())
    }
}

pub struct TxUpdateStakeApprover {
    base: TxBase,
    approver: Address,
}

impl TxUpdateStakeApprover {
    pub fn new(base: TxBase) -> Self {
        Self {
            base,
            approver: Address::ZERO,
        }
    }
}

impl TxHandler for TxUpdateStakeApprover {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.require_to()?;
        self.base.forbid_amount()?;
        let input: UpdateStakeApproverInput = self.base.tx.decode_data()?;
        self.approver = input.approver;
        Ok(())
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let tx = &self.base.tx;
        let pool = self.base.recipient()?;
        cs.load_ledger(&pool)?;
        pool.update_stake_approver(&tx.from, &self.approver, &tx.signers)?;
        self.base.accept()?;
        debug!(pool = %pool.id(), staker = %tx.from, approver = %self.approver, "stake approver updated");
        Ok(())
    }
}
