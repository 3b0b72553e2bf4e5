//! Lending transactions. The lender opens a book on its own account;
//! borrowers borrow from and repay to it.

use ldc_common::prelude::*;
use ldc_state::{ChainState, LendingConfig};
use num_traits::Zero;
use tracing::debug;

use crate::base::TxBase;
use crate::context::ChainContext;
use crate::txhandler::TxHandler;
use crate::types::{BorrowInput, OpenLendingInput};

pub struct TxOpenLending {
    base: TxBase,
    cfg: OpenLendingInput,
}

impl TxOpenLending {
    pub fn new(base: TxBase) -> Self {
        Self {
            base,
            cfg: LendingConfig::default(),
        }
    }
}

impl TxHandler for TxOpenLending {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.forbid_to()?;
        self.base.forbid_amount()?;
        let cfg: OpenLendingInput = self.base.tx.decode_data()?;
        cfg.syntactic_verify()?;
        self.cfg = cfg;
        Ok(())
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let lender = self.base.sender()?;
        lender.open_lending(&self.cfg)?;
        self.base.accept()?;
        debug!(lender = %lender.id(), token = %self.cfg.token, "lending opened");
        Ok(())
    }
}

pub struct TxCloseLending {
    base: TxBase,
}

impl TxCloseLending {
    pub fn new(base: TxBase) -> Self {
        Self { base }
    }
}

impl TxHandler for TxCloseLending {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.forbid_to()?;
        self.base.forbid_amount()?;
        self.base.forbid_data()
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let lender = self.base.sender()?;
        lender.close_lending()?;
        self.base.accept()?;
        debug!(lender = %lender.id(), "lending closed");
        Ok(())
    }
}

pub struct TxBorrow {
    base: TxBase,
    input: Option<BorrowInput>,
}

impl TxBorrow {
    pub fn new(base: TxBase) -> Self {
        Self { base, input: None }
    }
}

impl TxHandler for TxBorrow {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.require_to()?;
        self.base.forbid_amount()?;
        let input: BorrowInput = self.base.tx.decode_data()?;
        if input.amount.is_zero() {
            return Err(LedgerError::validation("Borrow: invalid amount 0"));
        }
        self.input = Some(input);
        Ok(())
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        let input = self
            .input
            .clone()
            .ok_or_else(|| LedgerError::internal("Borrow: input not verified"))?;
        self.base.verify(ctx, cs)?;
        let tx = &self.base.tx;
        let borrower = self.base.sender()?;
        let lender = self.base.recipient()?;

        // the lender co-signs every loan
        lender.check_keepers_signing(tx.kind, &tx.ex_signers)?;
        lender.borrow(&tx.token, &tx.from, &input.amount, input.due_time, tx.timestamp)?;
        self.base.accept()?;
        lender.sub(&tx.token, &input.amount)?;
        borrower.add(&tx.token, &input.amount)?;

        debug!(lender = %lender.id(), borrower = %tx.from, amount = %input.amount, "borrowed");
        Ok(())
    }
}

pub struct TxRepay {
    base: TxBase,
}

impl TxRepay {
    pub fn new(base: TxBase) -> Self {
        Self { base }
    }
}

impl TxHandler for TxRepay {
    fn base(&self) -> &TxBase {
        &self.base
    }

    fn syntactic_verify(&mut self) -> LedgerResult<()> {
        self.base.syntactic_verify()?;
        self.base.require_to()?;
        self.base.require_amount()?;
        self.base.forbid_data()
    }

    fn apply(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        self.base.verify(ctx, cs)?;
        let tx = &self.base.tx;
        let lender = self.base.recipient()?;

        let actual = lender.repay(&tx.token, &tx.from, &self.base.amount, tx.timestamp)?;
        // only the owed part moves
        self.base.amount = actual;
        self.base.accept()?;

        debug!(lender = %lender.id(), borrower = %self.base.tx.from, repaid = %self.base.amount, "repaid");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::types::Transaction;
    use ldc_state::MemoryState;

    const DAY: u64 = 86_400;

    fn lending_cfg() -> LendingConfig {
        LendingConfig {
            token: TokenSymbol::NATIVE,
            daily_interest: 10_000,
            overdue_interest: 20_000,
            min_amount: ldc(1),
            max_amount: ldc(1_000),
        }
    }

    fn open(cs: &mut MemoryState, ctx: &crate::context::BlockContext) {
        let tx = Transaction::new(TxKind::OpenLending, CHAIN_ID, addr(1), 0)
            .with_gas(GAS, 0, GAS_PRICE)
            .with_timestamp(NOW)
            .with_data(&lending_cfg())
            .unwrap();
        apply(ctx, cs, tx).unwrap();
    }

    fn borrow_tx(nonce: u64, amount: Amount, due_time: u64) -> Transaction {
        Transaction::new(TxKind::Borrow, CHAIN_ID, addr(2), nonce)
            .with_to(addr(1))
            .with_gas(GAS, 0, GAS_PRICE)
            .with_timestamp(NOW)
            .with_ex_signers(vec![addr(1)])
            .with_data(&BorrowInput { amount, due_time })
            .unwrap()
    }

    fn repay_tx(nonce: u64, amount: Amount, at: Timestamp) -> Transaction {
        Transaction::new(TxKind::Repay, CHAIN_ID, addr(2), nonce)
            .with_to(addr(1))
            .with_amount(TokenSymbol::NATIVE, amount)
            .with_gas(GAS, 0, GAS_PRICE)
            .with_timestamp(at)
    }

    #[test]
    fn test_borrow_and_repay_with_interest() {
        let (ctx, mut cs) = setup();
        open(&mut cs, &ctx);
        apply(&ctx, &mut cs, borrow_tx(0, ldc(100), 0)).unwrap();
        assert_eq!(
            balance(&mut cs, addr(2)),
            ldc(INITIAL) + ldc(100) - cost()
        );

        // one day at 1% daily, overpaying settles exactly what is owed
        apply(&ctx, &mut cs, repay_tx(1, ldc(200), NOW + DAY)).unwrap();
        assert_eq!(
            balance(&mut cs, addr(2)),
            ldc(INITIAL) - ldc(1) - cost() - cost()
        );
        assert_eq!(
            balance(&mut cs, addr(1)),
            ldc(INITIAL) + ldc(1) - cost()
        );
        let lender = cs.load_account(&addr(1)).unwrap();
        assert!(lender.lending().unwrap().entries.is_empty());
    }

    #[test]
    fn test_partial_repay_keeps_entry() {
        let (ctx, mut cs) = setup();
        open(&mut cs, &ctx);
        apply(&ctx, &mut cs, borrow_tx(0, ldc(100), 0)).unwrap();
        apply(&ctx, &mut cs, repay_tx(1, ldc(40), NOW)).unwrap();

        let lender = cs.load_account(&addr(1)).unwrap();
        let entry = lender.lending().unwrap().entries[&addr(2)].clone();
        assert_eq!(entry.amount, ldc(60));
    }

    #[test]
    fn test_borrow_needs_lender_signature() {
        let (ctx, mut cs) = setup();
        open(&mut cs, &ctx);
        let tx = borrow_tx(0, ldc(10), 0).with_ex_signers(vec![addr(3)]);
        let err = apply(&ctx, &mut cs, tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationFailure);
        assert_eq!(balance(&mut cs, addr(2)), ldc(INITIAL));
    }

    #[test]
    fn test_borrow_without_lending_book() {
        let (ctx, mut cs) = setup();
        let err = apply(&ctx, &mut cs, borrow_tx(0, ldc(10), 0)).unwrap_err();
        assert_eq!(err.account_error(), Some(&AccountError::LendingNotOpened));
    }

    #[test]
    fn test_borrow_above_max() {
        let (ctx, mut cs) = setup();
        open(&mut cs, &ctx);
        let err = apply(&ctx, &mut cs, borrow_tx(0, ldc(1_001), 0)).unwrap_err();
        assert!(matches!(
            err.account_error(),
            Some(AccountError::AmountAboveMaximum { .. })
        ));
    }

    #[test]
    fn test_close_lending_after_repay() {
        let (ctx, mut cs) = setup();
        open(&mut cs, &ctx);
        apply(&ctx, &mut cs, borrow_tx(0, ldc(10), 0)).unwrap();

        let close = |nonce| {
            Transaction::new(TxKind::CloseLending, CHAIN_ID, addr(1), nonce)
                .with_gas(GAS, 0, GAS_PRICE)
                .with_timestamp(NOW)
        };
        let err = apply(&ctx, &mut cs, close(1)).unwrap_err();
        assert_eq!(err.account_error(), Some(&AccountError::LendingNotClosed(1)));

        apply(&ctx, &mut cs, repay_tx(1, ldc(10), NOW)).unwrap();
        apply(&ctx, &mut cs, close(1)).unwrap();
        assert!(cs.load_account(&addr(1)).unwrap().lending().is_none());
    }

    #[test]
    fn test_open_lending_rejects_bad_config() {
        let mut cfg = lending_cfg();
        cfg.max_amount = Amount::zero();
        let tx = Transaction::new(TxKind::OpenLending, CHAIN_ID, addr(1), 0)
            .with_timestamp(NOW)
            .with_data(&cfg)
            .unwrap();
        let mut handler = crate::txhandler::new_handler(tx);
        assert_eq!(handler.syntactic_verify().unwrap_err().kind(), ErrorKind::Invalid);
    }
}
