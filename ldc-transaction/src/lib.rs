// lib.rs

//! Transactions of the LDC ledger and the handlers that apply them.
//!
//! Every handler runs the same protocol from [`TxBase`]: structural checks
//! without state, then `verify` against state, the kind-specific mutation,
//! and `accept` which settles gas, amount and nonce. A failed `apply` may
//! leave partial changes behind; the caller reverts the chain state.

pub mod account;
pub mod base;
pub mod context;
pub mod lending;
pub mod stake;
pub mod txhandler;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use base::*;
pub use context::*;
pub use txhandler::*;
pub use types::*;
