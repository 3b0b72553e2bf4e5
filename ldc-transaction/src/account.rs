//! Plain account transactions: Transfer, UpdateAccountInfo, AddNonceTable.

use ldc_common::prelude::*;
use ldc_state::ChainState;
use tracing::debug;

use crate::base::TxBase;
use crate::context::ChainContext;
use crate::txhandler::TxHandler;
use crate::types::{NonceTableInput, TxAccounter};

pub struct TxTransfer {
    base: TxBase,
}

impl TxTransfer {
    pub fn new(base: TxBase) -> Self {
        Self { base }
    }
}

impl TxHandler for TxTransfer {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.require_to()?;
        self.base.require_amount()
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        self.base.accept()?;
        debug!(from = %self.base.tx.from, amount = %self.base.amount, token = %self.base.tx.token, "transfer applied");
        Ok(())
    }
}

pub struct TxUpdateAccountInfo {
    base: TxBase,
    input: TxAccounter,
}

impl TxUpdateAccountInfo {
    pub fn new(base: TxBase) -> Self {
        Self {
            base,
            input: TxAccounter::default(),
        }
    }
}

impl TxHandler for TxUpdateAccountInfo {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.forbid_to()?;
        self.base.forbid_amount()?;

        let input: TxAccounter = self.base.tx.decode_data()?;
        input.syntactic_verify()?;
        if input.stake.is_some() {
            return Err(LedgerError::validation("UpdateAccountInfo: stake not allowed"));
        }
        if input.threshold.is_none()
            && input.keepers.is_none()
            && input.approver.is_none()
            && input.approve_list.is_none()
        {
            return Err(LedgerError::validation("UpdateAccountInfo: nothing to update"));
        }
        self.input = input;
        Ok(())
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let sender = self.base.sender()?;
        let input = self.input.clone();
        sender.update_keepers(input.threshold, input.keepers, input.approver, input.approve_list)?;
        self.base.accept()?;
        debug!(account = %sender.id(), "account info updated");
        Ok(())
    }
}

pub struct TxAddNonceTable {
    base: TxBase,
    input: NonceTableInput,
}

impl TxAddNonceTable {
    pub fn new(base: TxBase) -> Self {
        Self {
            base,
            input: NonceTableInput {
                expire: 0,
                nonces: Vec::new(),
            },
        }
    }
}

impl TxHandler for TxAddNonceTable {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.forbid_to()?;
        self.base.forbid_amount()?;

        let input: NonceTableInput = self.base.tx.decode_data()?;
        if input.nonces.is_empty() {
            return Err(LedgerError::validation("AddNonceTable: no nonces"));
        }
        self.input = input;
        Ok(())
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let sender = self.base.sender()?;
        sender.add_nonce_table(self.input.expire, &self.input.nonces, self.base.tx.timestamp)?;
        self.base.accept()?;
        debug!(account = %sender.id(), expire = self.input.expire, count = self.input.nonces.len(), "nonce table updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::txhandler::new_handler;
    use crate::types::Transaction;

    #[test]
    fn test_transfer() {
        let (ctx, mut cs) = setup();
        let tx = Transaction::new(TxKind::Transfer, CHAIN_ID, addr(1), 0)
            .with_to(addr(2))
            .with_amount(TokenSymbol::NATIVE, ldc(5))
            .with_gas(GAS, 0, GAS_PRICE)
            .with_timestamp(NOW);
        apply(&ctx, &mut cs, tx).unwrap();

        assert_eq!(balance(&mut cs, addr(2)), ldc(5));
        assert_eq!(balance(&mut cs, addr(1)), ldc(INITIAL) - ldc(5) - cost());
    }

    #[test]
    fn test_transfer_requires_recipient_and_amount() {
        let tx = Transaction::new(TxKind::Transfer, CHAIN_ID, addr(1), 0).with_timestamp(NOW);
        assert!(new_handler(tx.clone()).syntactic_verify().is_err());
        let tx = tx.with_to(addr(2));
        assert!(new_handler(tx).syntactic_verify().is_err());
    }

    #[test]
    fn test_update_account_info_installs_keepers() {
        let (ctx, mut cs) = setup();
        let tx = Transaction::new(TxKind::UpdateAccountInfo, CHAIN_ID, addr(1), 0)
            .with_gas(GAS, 0, GAS_PRICE)
            .with_timestamp(NOW)
            .with_data(&TxAccounter {
                threshold: Some(2),
                keepers: Some(vec![addr(7), addr(8)]),
                ..Default::default()
            })
            .unwrap();
        apply(&ctx, &mut cs, tx).unwrap();

        // the own address no longer suffices
        let tx = Transaction::new(TxKind::Transfer, CHAIN_ID, addr(1), 1)
            .with_to(addr(2))
            .with_amount(TokenSymbol::NATIVE, ldc(1))
            .with_gas(GAS, 0, GAS_PRICE)
            .with_timestamp(NOW);
        let err = apply(&ctx, &mut cs, tx.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationFailure);

        let tx = tx.with_signers(vec![addr(7), addr(8)]);
        apply(&ctx, &mut cs, tx).unwrap();
    }

    #[test]
    fn test_add_nonce_table() {
        let (ctx, mut cs) = setup();
        let tx = Transaction::new(TxKind::AddNonceTable, CHAIN_ID, addr(1), 0)
            .with_gas(GAS, 0, GAS_PRICE)
            .with_timestamp(NOW)
            .with_data(&NonceTableInput {
                expire: NOW + 3600,
                nonces: vec![9, 3, 3],
            })
            .unwrap();
        apply(&ctx, &mut cs, tx).unwrap();

        let acc = cs.load_account(&addr(1)).unwrap();
        assert_eq!(acc.data().nonce_table[&(NOW + 3600)], vec![3, 9]);
        assert_eq!(acc.nonce(), 1);
    }
}
