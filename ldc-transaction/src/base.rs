//! Common verify/accept protocol every transaction handler runs through.
//!
//! `verify` loads the involved accounts and checks everything that does not
//! depend on the operation: chain id, fee cap, nonce, account-type gating,
//! signatures and affordability. `accept` charges the gas, moves the
//! transferred amount, pays miner and treasury and bumps the sender nonce.

use ldc_common::prelude::*;
use ldc_state::{Account, ChainState};
use num_traits::Zero;
use std::sync::Arc;

use crate::context::ChainContext;
use crate::types::Transaction;

/// Accounts loaded by [`TxBase::verify`]
pub struct Loaded {
    pub sender: Arc<Account>,
    pub recipient: Option<Arc<Account>>,
    pub miner: Option<Arc<Account>>,
    pub treasury: Arc<Account>,
}

pub struct TxBase {
    pub tx: Transaction,
    /// Amount moved from sender to recipient on accept
    pub amount: Amount,
    gas_price: u64,
    /// Gas may be paid out of the sender's pledge
    pledge_pays_gas: bool,
    loaded: Option<Loaded>,
}

impl TxBase {
    pub fn new(tx: Transaction) -> Self {
        let amount = tx.amount_or_zero();
        Self {
            tx,
            amount,
            gas_price: 0,
            pledge_pays_gas: false,
            loaded: None,
        }
    }

    /// Lets the sender's pledge cover gas once its spendable balance runs
    /// out. Only for amount-free kinds that release the pledge right after
    /// `accept`.
    pub fn with_pledge_for_gas(mut self) -> Self {
        self.pledge_pays_gas = true;
        self
    }

    pub fn kind(&self) -> TxKind {
        self.tx.kind
    }

    /// Structural checks shared by every kind.
    pub fn syntactic_verify(&self) -> LedgerResult<()> {
        let tx = &self.tx;
        ValidationUtils::validate_timestamp(tx.timestamp)?;
        ValidationUtils::validate_data_size(&tx.data)?;
        if tx.chain_id == 0 {
            return Err(LedgerError::validation("invalid chain id 0"));
        }
        if tx.from.is_zero() {
            return Err(LedgerError::validation("invalid from, zero address"));
        }
        if tx.signers.is_empty() {
            return Err(LedgerError::validation("no signers"));
        }
        if tx.gas_tip > tx.gas_fee_cap {
            return Err(LedgerError::validation(format!(
                "invalid gas tip, expected <= {}, got {}",
                tx.gas_fee_cap, tx.gas_tip
            )));
        }
        if let Some(to) = &tx.to {
            if to.is_zero() {
                return Err(LedgerError::validation("invalid to, zero address"));
            }
        }
        Ok(())
    }

    pub fn require_to(&self) -> LedgerResult<Address> {
        self.tx
            .to
            .ok_or_else(|| LedgerError::validation(format!("{}: missing to", self.kind())))
    }

    pub fn forbid_to(&self) -> LedgerResult<()> {
        if self.tx.to.is_some() {
            return Err(LedgerError::validation(format!("{}: to not allowed", self.kind())));
        }
        Ok(())
    }

    pub fn require_amount(&self) -> LedgerResult<()> {
        if !self.tx.has_amount() {
            return Err(LedgerError::validation(format!("{}: missing amount", self.kind())));
        }
        Ok(())
    }

    pub fn forbid_amount(&self) -> LedgerResult<()> {
        if self.tx.has_amount() {
            return Err(LedgerError::validation(format!(
                "{}: amount not allowed",
                self.kind()
            )));
        }
        Ok(())
    }

    pub fn forbid_data(&self) -> LedgerResult<()> {
        if !self.tx.data.is_empty() {
            return Err(LedgerError::validation(format!("{}: data not allowed", self.kind())));
        }
        Ok(())
    }

    /// Total gas charged to the sender.
    pub fn cost(&self) -> Amount {
        Amount::from(self.tx.gas) * (Amount::from(self.gas_price) + self.tx.gas_tip)
    }

    fn miner_fee(&self) -> Amount {
        Amount::from(self.tx.gas) * self.tx.gas_tip
    }

    fn treasury_fee(&self) -> Amount {
        Amount::from(self.tx.gas) * self.gas_price
    }

    /// Accounts loaded by the last successful `verify`.
    pub fn loaded(&self) -> LedgerResult<&Loaded> {
        self.loaded
            .as_ref()
            .ok_or_else(|| LedgerError::internal(format!("{}: accounts not loaded", self.kind())))
    }

    pub fn sender(&self) -> LedgerResult<Arc<Account>> {
        Ok(Arc::clone(&self.loaded()?.sender))
    }

    pub fn recipient(&self) -> LedgerResult<Arc<Account>> {
        self.loaded()?
            .recipient
            .clone()
            .ok_or_else(|| LedgerError::internal(format!("{}: recipient not loaded", self.kind())))
    }

    pub fn verify(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        let kind = self.kind();
        self.verify_inner(ctx, cs)
            .with_context(|| format!("{}.verify", kind))
    }

    fn verify_inner(&mut self, ctx: &dyn ChainContext, cs: &mut dyn ChainState) -> LedgerResult<()> {
        let tx = &self.tx;
        if tx.chain_id != ctx.chain_id() {
            return Err(LedgerError::validation(format!(
                "invalid chain id, expected {}, got {}",
                ctx.chain_id(),
                tx.chain_id
            )));
        }
        let fee_needed = ctx.gas_price().saturating_add(tx.gas_tip);
        if fee_needed > tx.gas_fee_cap {
            return Err(LedgerError::validation(format!(
                "invalid gas fee cap, expected >= {}, got {}",
                fee_needed, tx.gas_fee_cap
            )));
        }
        self.gas_price = ctx.gas_price();

        let sender = cs.load_account(&tx.from)?;
        sender.check_nonce(tx.nonce)?;
        sender.check_as_from(tx.kind)?;
        sender.check_signing(tx.kind, &tx.signers)?;

        let recipient = match &tx.to {
            Some(to) => {
                let acc = cs.load_account(to)?;
                acc.check_as_to(tx.kind)?;
                Some(acc)
            }
            None => None,
        };

        let cost = self.cost();
        if self.pledge_pays_gas {
            sender.check_balance_with_pledge(&cost)?;
        } else if tx.token.is_native() {
            sender.check_balance(&TokenSymbol::NATIVE, &(cost + &self.amount))?;
        } else {
            sender.check_balance(&TokenSymbol::NATIVE, &cost)?;
            sender.check_balance(&tx.token, &self.amount)?;
        }

        let miner = match ctx.miner() {
            Some(symbol) => Some(cs.load_miner(symbol)?),
            None => None,
        };
        let treasury = cs.load_account(&ctx.treasury())?;

        self.loaded = Some(Loaded {
            sender,
            recipient,
            miner,
            treasury,
        });
        Ok(())
    }

    pub fn accept(&self) -> LedgerResult<()> {
        self.accept_inner()
            .with_context(|| format!("{}.accept", self.kind()))
    }

    fn accept_inner(&self) -> LedgerResult<()> {
        let loaded = self.loaded()?;
        let native = TokenSymbol::NATIVE;

        if self.pledge_pays_gas {
            loaded.sender.sub_with_pledge(&self.cost())?;
        } else {
            loaded.sender.sub(&native, &self.cost())?;
        }
        if !self.amount.is_zero() {
            let recipient = loaded.recipient.as_ref().ok_or_else(|| {
                LedgerError::internal(format!("{}: amount without recipient", self.kind()))
            })?;
            loaded.sender.sub(&self.tx.token, &self.amount)?;
            recipient.add(&self.tx.token, &self.amount)?;
        }

        let tip = self.miner_fee();
        match &loaded.miner {
            Some(miner) => miner.add(&native, &tip)?,
            None => loaded.treasury.add(&native, &tip)?,
        }
        loaded.treasury.add(&native, &self.treasury_fee())?;

        loaded.sender.increment_nonce()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BlockContext;
    use ldc_common::types::ADDRESS_SIZE;
    use ldc_state::MemoryState;
    use std::str::FromStr;

    const NOW: Timestamp = 1_700_000_000;

    fn addr(b: u8) -> Address {
        Address::new([b; ADDRESS_SIZE])
    }

    fn funded_state() -> MemoryState {
        let mut cs = MemoryState::new();
        let alice = cs.load_account(&addr(1)).unwrap();
        alice.add(&TokenSymbol::NATIVE, &ldc(100)).unwrap();
        cs.commit().unwrap();
        cs
    }

    fn transfer(nonce: u64) -> Transaction {
        Transaction::new(TxKind::Transfer, 1, addr(1), nonce)
            .with_to(addr(2))
            .with_amount(TokenSymbol::NATIVE, ldc(10))
            .with_gas(1_000, 100, 10_000)
            .with_timestamp(NOW)
    }

    #[test]
    fn test_verify_and_accept_moves_fees() {
        let mut cs = funded_state();
        let ctx = BlockContext::new(1, 1_000).with_miner(StakeSymbol::from_str("#MINER").unwrap());

        let mut base = TxBase::new(transfer(0));
        base.verify(&ctx, &mut cs).unwrap();
        base.accept().unwrap();

        let alice = cs.load_account(&addr(1)).unwrap();
        assert_eq!(alice.nonce(), 1);
        let cost = Amount::from(1_000u64 * 1_100);
        assert_eq!(alice.balance(), ldc(90) - &cost);

        assert_eq!(cs.load_account(&addr(2)).unwrap().balance(), ldc(10));
        let miner = cs
            .load_miner(&StakeSymbol::from_str("#MINER").unwrap())
            .unwrap();
        assert_eq!(miner.balance(), Amount::from(100_000u64));
        let treasury = cs.load_account(&Address::ZERO).unwrap();
        assert_eq!(treasury.balance(), Amount::from(1_000_000u64));
    }

    #[test]
    fn test_tip_goes_to_treasury_without_miner() {
        let mut cs = funded_state();
        let ctx = BlockContext::new(1, 1_000);
        let mut base = TxBase::new(transfer(0));
        base.verify(&ctx, &mut cs).unwrap();
        base.accept().unwrap();
        let treasury = cs.load_account(&Address::ZERO).unwrap();
        assert_eq!(treasury.balance(), Amount::from(1_100_000u64));
    }

    #[test]
    fn test_pledge_covers_gas_when_allowed() {
        let mut cs = MemoryState::new();
        let pooled = cs.load_account(&addr(5)).unwrap();
        pooled.add(&TokenSymbol::NATIVE, &ldc(1)).unwrap();
        pooled.lock_pledge(&ldc(1)).unwrap();
        cs.commit().unwrap();

        let ctx = BlockContext::new(1, 1_000);
        let tx = Transaction::new(TxKind::Transfer, 1, addr(5), 0)
            .with_to(addr(2))
            .with_gas(1_000, 0, 1_000)
            .with_timestamp(NOW);

        let err = TxBase::new(tx.clone()).verify(&ctx, &mut cs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        cs.revert();

        let mut base = TxBase::new(tx).with_pledge_for_gas();
        base.verify(&ctx, &mut cs).unwrap();
        base.accept().unwrap();
        let pooled = cs.load_account(&addr(5)).unwrap();
        assert!(pooled.balance().is_zero());
        assert_eq!(pooled.pledge(), ldc(1) - Amount::from(1_000_000u64));
    }

    #[test]
    fn test_verify_rejections() {
        let mut cs = funded_state();
        let ctx = BlockContext::new(1, 1_000);

        let err = TxBase::new(transfer(1)).verify(&ctx, &mut cs).unwrap_err();
        assert!(matches!(
            err.account_error(),
            Some(AccountError::NonceMismatch { .. })
        ));

        let wrong_chain = BlockContext::new(2, 1_000);
        assert!(TxBase::new(transfer(0))
            .verify(&wrong_chain, &mut cs)
            .is_err());

        let pricey = BlockContext::new(1, 9_950);
        let err = TxBase::new(transfer(0)).verify(&pricey, &mut cs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let unsigned = transfer(0).with_signers(vec![addr(9)]);
        let err = TxBase::new(unsigned).verify(&ctx, &mut cs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationFailure);

        let too_much = transfer(0).with_amount(TokenSymbol::NATIVE, ldc(100));
        let err = TxBase::new(too_much).verify(&ctx, &mut cs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert!(err.to_string().starts_with("Transfer.verify: "));
    }

    #[test]
    fn test_syntactic_verify() {
        assert!(TxBase::new(transfer(0)).syntactic_verify().is_ok());
        assert!(TxBase::new(transfer(0).with_timestamp(0))
            .syntactic_verify()
            .is_err());
        assert!(TxBase::new(transfer(0).with_to(Address::ZERO))
            .syntactic_verify()
            .is_err());
        assert!(TxBase::new(transfer(0).with_gas(1, 20_000, 10_000))
            .syntactic_verify()
            .is_err());
    }

    #[test]
    fn test_accept_requires_verify() {
        let base = TxBase::new(transfer(0));
        assert_eq!(base.accept().unwrap_err().kind(), ErrorKind::Internal);
    }
}
