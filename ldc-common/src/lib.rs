//! # LDC Common
//!
//! Common utilities, types and standardized patterns for the LDC ledger.
//! This crate is the single source of truth for functionality shared by the
//! state, transaction and core crates, preventing circular dependencies.
//!
//! ## Modules
//!
//! - **types**: Addresses, token and stake symbols, transaction kinds, signer sets
//! - **error**: The error taxonomy and the crate-wide [`LedgerError`](error::LedgerError)
//! - **config**: Chain-wide fee configuration
//! - **serialization**: Standardized data encoding/decoding patterns
//! - **validation**: Input validation utilities
//!
//! ## Example Usage
//!
//! ```rust
//! use ldc_common::prelude::*;
//! use std::str::FromStr;
//!
//! let pool = StakeSymbol::from_str("#LDC").unwrap();
//! assert_eq!(pool.address().as_stake_symbol(), Some(pool));
//! assert_eq!(ldc(1), Amount::from(units::LDC));
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod serialization;
pub mod types;
pub mod validation;

/// Re-export commonly used types and traits
pub mod prelude {
    pub use crate::config::FeeConfig;
    pub use crate::error::{AccountError, ErrorKind, LedgerError, LedgerResult, ResultExt};
    pub use crate::serialization::{EncodingType, LedgerSerialize};
    pub use crate::types::{
        ldc, units, Address, Amount, Signers, StakeSymbol, Timestamp, TokenSymbol, TxKind,
    };
    pub use crate::validation::ValidationUtils;
}

/// LDC Common crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
