// lib.rs - LDC Core Library
//! # LDC Core
//!
//! Runs transactions against the LDC account and staking ledger.
//!
//! ## Components
//!
//! - **[`LedgerConfig`]**: chain id, gas price, miner, treasury and pledge
//!   parameters, loaded from TOML, YAML or JSON
//! - **[`LedgerEngine`]**: applies transactions all-or-nothing and logs each
//!   outcome
//! - **snapshot**: JSON replay documents used by the `ldc-replay` binary
//!
//! ## Example
//!
//! ```rust
//! use ldc_core::prelude::*;
//! use ldc_state::{ChainState, MemoryState};
//! use ldc_transaction::Transaction;
//!
//! # fn main() -> LedgerResult<()> {
//! let alice = Address::new([1u8; 20]);
//! let mut state = MemoryState::new();
//! state.load_account(&alice)?.add(&TokenSymbol::NATIVE, &ldc(10))?;
//! state.commit()?;
//!
//! let cfg = LedgerConfig { chain_id: 1, ..Default::default() };
//! let mut engine = LedgerEngine::from_config(&cfg, state)?;
//! let tx = Transaction::new(TxKind::Transfer, 1, alice, 0)
//!     .with_to(Address::new([2u8; 20]))
//!     .with_amount(TokenSymbol::NATIVE, ldc(1))
//!     .with_gas(100, 0, 1_000)
//!     .with_timestamp(1_700_000_000);
//! let receipt = engine.apply(tx)?;
//! assert_eq!(receipt.nonce, 0);
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

/// Configuration module
pub mod config;

/// Transaction engine
pub mod engine;

/// Replay documents
pub mod snapshot;

/// Prelude with commonly used types
pub mod prelude {
    pub use crate::config::LedgerConfig;
    pub use crate::engine::{LedgerEngine, TxReceipt};
    // Re-export ldc-common prelude
    pub use ldc_common::prelude::*;
}

// Re-export main types at crate root
pub use config::LedgerConfig;
pub use engine::{EngineStats, LedgerEngine, TxReceipt};
pub use snapshot::{AccountSnapshot, ReplayDocument};

/// LDC version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
