//! Shared fixtures for handler tests.

use ldc_common::prelude::*;
use ldc_common::types::ADDRESS_SIZE;
use ldc_state::{ChainState, MemoryState};

use crate::context::{BlockContext, ChainContext};
use crate::txhandler::new_handler;
use crate::types::Transaction;

pub const CHAIN_ID: u64 = 1;
pub const GAS: u64 = 1_000;
pub const GAS_PRICE: u64 = 1_000;
pub const NOW: Timestamp = 1_700_000_000;
/// LDC funded to addr(1)..=addr(4)
pub const INITIAL: u64 = 100_000;

pub fn addr(b: u8) -> Address {
    Address::new([b; ADDRESS_SIZE])
}

pub fn cost() -> Amount {
    Amount::from(GAS * GAS_PRICE)
}

pub fn setup() -> (BlockContext, MemoryState) {
    let mut cs = MemoryState::new();
    for b in 1..=4 {
        let acc = cs.load_account(&addr(b)).unwrap();
        acc.add(&TokenSymbol::NATIVE, &ldc(INITIAL)).unwrap();
    }
    cs.commit().unwrap();
    (BlockContext::new(CHAIN_ID, GAS_PRICE), cs)
}

/// Runs one transaction all-or-nothing.
pub fn apply(ctx: &dyn ChainContext, cs: &mut MemoryState, tx: Transaction) -> LedgerResult<()> {
    let mut handler = new_handler(tx);
    let result = match handler.syntactic_verify() {
        Ok(()) => handler.apply(ctx, &mut *cs),
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => cs.commit(),
        Err(err) => {
            cs.revert();
            Err(err)
        }
    }
}

pub fn balance(cs: &mut MemoryState, id: Address) -> Amount {
    cs.load_account(&id).unwrap().balance()
}
