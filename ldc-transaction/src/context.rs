//! Block-level parameters visible to transaction handlers.

use ldc_common::prelude::*;

pub trait ChainContext {
    fn chain_id(&self) -> u64;

    /// Base gas price, credited to the treasury
    fn gas_price(&self) -> u64;

    fn fee_config(&self) -> &FeeConfig;

    /// Stake pool that produced the block, receiver of gas tips
    fn miner(&self) -> Option<&StakeSymbol>;

    /// Receiver of base gas fees, and of tips when there is no miner
    fn treasury(&self) -> Address;
}

/// Static context for one block.
#[derive(Debug, Clone)]
pub struct BlockContext {
    pub chain_id: u64,
    pub gas_price: u64,
    pub miner: Option<StakeSymbol>,
    pub treasury: Address,
    pub fee: FeeConfig,
}

impl BlockContext {
    pub fn new(chain_id: u64, gas_price: u64) -> Self {
        Self {
            chain_id,
            gas_price,
            miner: None,
            treasury: Address::ZERO,
            fee: FeeConfig::default(),
        }
    }

    pub fn with_miner(mut self, miner: StakeSymbol) -> Self {
        self.miner = Some(miner);
        self
    }

    pub fn with_fee_config(mut self, fee: FeeConfig) -> Self {
        self.fee = fee;
        self
    }
}

impl ChainContext for BlockContext {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn gas_price(&self) -> u64 {
        self.gas_price
    }

    fn fee_config(&self) -> &FeeConfig {
        &self.fee
    }

    fn miner(&self) -> Option<&StakeSymbol> {
        self.miner.as_ref()
    }

    fn treasury(&self) -> Address {
        self.treasury
    }
}
