//ldc-common/src/config.rs
//! Chain-wide fee configuration consumed by transaction handlers

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::types::{units::LDC, Amount};

/// Fee and pledge parameters of the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Minimum pledge locked by a token issuer account (nano LDC)
    pub min_token_pledge: u64,

    /// Minimum pledge locked by a stake pool account (nano LDC)
    pub min_stake_pledge: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            min_token_pledge: 10_000 * LDC,
            min_stake_pledge: 1_000 * LDC,
        }
    }
}

impl FeeConfig {
    /// Validate configuration
    pub fn validate(&self) -> LedgerResult<()> {
        if self.min_stake_pledge == 0 {
            return Err(LedgerError::config("min_stake_pledge must be greater than 0"));
        }
        if self.min_token_pledge == 0 {
            return Err(LedgerError::config("min_token_pledge must be greater than 0"));
        }
        Ok(())
    }

    pub fn min_stake_pledge(&self) -> Amount {
        Amount::from(self.min_stake_pledge)
    }

    pub fn min_token_pledge(&self) -> Amount {
        Amount::from(self.min_token_pledge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = FeeConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.min_stake_pledge(), Amount::from(1_000 * LDC));
    }

    #[test]
    fn test_zero_pledge_rejected() {
        let cfg = FeeConfig {
            min_stake_pledge: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
