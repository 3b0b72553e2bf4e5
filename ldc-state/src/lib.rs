//! # LDC State
//!
//! Account state of the LDC ledger.
//!
//! ## Components
//!
//! ### [`Account`]
//! - Balance ledger for the native token and any number of fungible tokens
//! - Pledge locked by stake pools, excluded from the spendable balance
//! - Keeper/threshold/approver authorization and the sequential nonce
//! - Nonce table of pre-authorized one-time nonces
//!
//! ### Staking sub-ledger
//! - Stake pools live at the reserved address of a `#SYMBOL`
//! - One [`StakeEntry`] per staker; surplus held by the pool is distributed
//!   proportionally as bonus before every entry change
//!
//! ### Lending
//! - An account may open a lending book and lend one token with daily interest
//!
//! ### [`ChainState`]
//! - Loads accounts and stake ledgers for transaction processing;
//!   [`MemoryState`] is the in-memory implementation
//!
//! ## Concurrency
//!
//! Each account carries its own lock, held for the whole duration of every
//! mutating call. Accounts are shared as `Arc<Account>`, so handlers may run
//! operations on different accounts from different threads.
//!
//! ## Example Usage
//!
//! ```rust
//! use ldc_common::prelude::*;
//! use ldc_state::{ChainState, MemoryState};
//!
//! # fn main() -> LedgerResult<()> {
//! let mut state = MemoryState::new();
//! let alice = state.load_account(&Address::new([1u8; 20]))?;
//! alice.add(&TokenSymbol::NATIVE, &ldc(10))?;
//! state.commit()?;
//!
//! let alice = state.load_account(&Address::new([1u8; 20]))?;
//! assert_eq!(alice.balance(), ldc(10));
//! # Ok(())
//! # }
//! ```

use ldc_common::prelude::*;
use std::sync::Arc;

pub mod account;
pub mod lending;
pub mod memory;
pub mod stake;

pub use account::{Account, AccountData, AccountType};
pub use lending::{AccountLending, LendingConfig, LendingEntry};
pub use memory::MemoryState;
pub use stake::{AccountLedger, BonusRate, StakeAccountInfo, StakeConfig, StakeEntry};

/// Access to accounts for transaction processing.
///
/// Accounts returned within one transaction are shared handles: loading the
/// same address twice yields the same account.
pub trait ChainState {
    /// Loads an account; unknown addresses yield an empty account.
    fn load_account(&mut self, id: &Address) -> LedgerResult<Arc<Account>>;

    /// Attaches the stake ledger to a stake account, or an empty one to an
    /// empty account that may become a stake pool. No-op otherwise.
    fn load_ledger(&mut self, acc: &Account) -> LedgerResult<()>;

    /// Loads the stake pool account that produced the current block.
    fn load_miner(&mut self, miner: &StakeSymbol) -> LedgerResult<Arc<Account>>;

    /// Persists every account touched since the last commit or revert.
    fn commit(&mut self) -> LedgerResult<()>;

    /// Discards every change since the last commit or revert.
    fn revert(&mut self);
}
