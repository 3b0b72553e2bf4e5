use ldc_common::prelude::*;
use ldc_state::ChainState;

use crate::account::{TxAddNonceTable, TxTransfer, TxUpdateAccountInfo};
use crate::base::TxBase;
use crate::context::ChainContext;
use crate::lending::{TxBorrow, TxCloseLending, TxOpenLending, TxRepay};
use crate::stake::{
    TxCreateStake, TxDestroyStake, TxResetStake, TxTakeStake, TxUpdateStakeApprover,
    TxWithdrawStake,
};
use crate::types::Transaction;

/// A transaction bound to the handler of its kind.
pub trait TxHandler: Send {
    fn base(&self) -> &TxBase;

    fn kind(&self) -> TxKind {
        self.base().kind()
    }

    /// Structural and payload checks, no state access.
    fn syntactic_verify(&mut self) -> LedgerResult<()>;

    /// Verifies against state, mutates and accepts. Leaves partial changes
    /// on failure; the caller reverts.
    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()>;
}

/// Builds the handler for `tx.kind`.
pub fn new_handler(tx: Transaction) -> Box<dyn TxHandler> {
    let base = TxBase::new(tx);
    match base.kind() {
        TxKind::Transfer => Box::new(TxTransfer::new(base)),
        TxKind::UpdateAccountInfo => Box::new(TxUpdateAccountInfo::new(base)),
        TxKind::AddNonceTable => Box::new(TxAddNonceTable::new(base)),
        TxKind::CreateStake => Box::new(TxCreateStake::new(base)),
        TxKind::ResetStake => Box::new(TxResetStake::new(base)),
        TxKind::DestroyStake => Box::new(TxDestroyStake::new(base)),
        TxKind::TakeStake => Box::new(TxTakeStake::new(base)),
        TxKind::WithdrawStake => Box::new(TxWithdrawStake::new(base)),
        TxKind::UpdateStakeApprover => Box::new(TxUpdateStakeApprover::new(base)),
        TxKind::OpenLending => Box::new(TxOpenLending::new(base)),
        TxKind::CloseLending => Box::new(TxCloseLending::new(base)),
        TxKind::Borrow => Box::new(TxBorrow::new(base)),
        TxKind::Repay => Box::new(TxRepay::new(base)),
    }
}
