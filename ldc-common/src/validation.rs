//! Input validation utilities and patterns

use crate::{
    error::{AccountError, LedgerError, LedgerResult},
    types::{units::PPM, Address, Timestamp},
};

/// Maximum number of keepers an account may register
pub const MAX_KEEPERS: usize = 64;

/// Maximum size of a transaction payload in bytes
pub const MAX_TX_DATA_SIZE: usize = 256 * 1024;

/// Validation utilities for common data types
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate timestamp
    pub fn validate_timestamp(timestamp: Timestamp) -> LedgerResult<()> {
        const MAX_TIMESTAMP: u64 = 32503680000; // 2999-12-31

        if timestamp == 0 {
            return Err(LedgerError::validation("Timestamp cannot be zero"));
        }

        if timestamp > MAX_TIMESTAMP {
            return Err(LedgerError::validation("Timestamp too far in future"));
        }

        Ok(())
    }

    /// Validate a lock time: either 0 (no lock) or strictly after `now`
    pub fn validate_lock_time(lock_time: u64, now: Timestamp) -> LedgerResult<()> {
        if lock_time != 0 && lock_time <= now {
            return Err(AccountError::LockTimeInPast {
                now,
                got: lock_time,
            }
            .into());
        }
        Ok(())
    }

    /// Validate a parts-per-million rate
    pub fn validate_ppm(value: u64, field_name: &str) -> LedgerResult<u64> {
        Self::validate_range(value, 0, PPM, field_name)
    }

    /// Validate a keeper set and its signing threshold
    pub fn validate_keepers(threshold: u16, keepers: &[Address]) -> LedgerResult<()> {
        if keepers.len() > MAX_KEEPERS {
            return Err(LedgerError::validation(format!(
                "too many keepers: {} (max {})",
                keepers.len(),
                MAX_KEEPERS
            )));
        }

        if threshold as usize > keepers.len() {
            return Err(LedgerError::validation(format!(
                "invalid threshold, expected <= {}, got {}",
                keepers.len(),
                threshold
            )));
        }

        if !keepers.is_empty() && threshold == 0 {
            return Err(LedgerError::validation("threshold cannot be zero"));
        }

        Self::validate_batch(
            keepers,
            |k| {
                if k.is_zero() {
                    Err(LedgerError::validation("zero address"))
                } else {
                    Ok(())
                }
            },
            "keepers",
        )?;

        let mut sorted = keepers.to_vec();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != keepers.len() {
            return Err(LedgerError::validation("duplicate keeper"));
        }

        Ok(())
    }

    /// Validate transaction payload size
    pub fn validate_data_size(data: &[u8]) -> LedgerResult<()> {
        if data.len() > MAX_TX_DATA_SIZE {
            return Err(LedgerError::validation(format!(
                "Data too large: {} bytes (max {})",
                data.len(),
                MAX_TX_DATA_SIZE
            )));
        }

        Ok(())
    }

    /// Validate range for numeric values
    pub fn validate_range<T: PartialOrd + Copy + std::fmt::Debug>(
        value: T,
        min: T,
        max: T,
        field_name: &str,
    ) -> LedgerResult<T> {
        if value < min || value > max {
            return Err(LedgerError::validation(format!(
                "{} out of range (min: {:?}, max: {:?}, got: {:?})",
                field_name, min, max, value
            )));
        }
        Ok(value)
    }

    /// Batch validation for multiple values
    pub fn validate_batch<T, F>(items: &[T], validator: F, field_name: &str) -> LedgerResult<()>
    where
        F: Fn(&T) -> LedgerResult<()>,
    {
        for (i, item) in items.iter().enumerate() {
            validator(item)
                .map_err(|e| LedgerError::validation(format!("{}[{}]: {}", field_name, i, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ADDRESS_SIZE;

    #[test]
    fn test_timestamp_validation() {
        assert!(ValidationUtils::validate_timestamp(1609459200).is_ok());
        assert!(ValidationUtils::validate_timestamp(0).is_err());
        assert!(ValidationUtils::validate_timestamp(99999999999).is_err());
    }

    #[test]
    fn test_lock_time_validation() {
        assert!(ValidationUtils::validate_lock_time(0, 1000).is_ok());
        assert!(ValidationUtils::validate_lock_time(1001, 1000).is_ok());
        let err = ValidationUtils::validate_lock_time(1000, 1000).unwrap_err();
        assert_eq!(
            err.account_error(),
            Some(&AccountError::LockTimeInPast { now: 1000, got: 1000 })
        );
        assert!(ValidationUtils::validate_lock_time(10, 1000).is_err());
    }

    #[test]
    fn test_ppm_validation() {
        assert!(ValidationUtils::validate_ppm(0, "fee").is_ok());
        assert!(ValidationUtils::validate_ppm(1_000_000, "fee").is_ok());
        assert!(ValidationUtils::validate_ppm(1_000_001, "fee").is_err());
    }

    #[test]
    fn test_keepers_validation() {
        let a = Address::new([1; ADDRESS_SIZE]);
        let b = Address::new([2; ADDRESS_SIZE]);

        assert!(ValidationUtils::validate_keepers(0, &[]).is_ok());
        assert!(ValidationUtils::validate_keepers(2, &[a, b]).is_ok());
        assert!(ValidationUtils::validate_keepers(3, &[a, b]).is_err());
        assert!(ValidationUtils::validate_keepers(0, &[a]).is_err());
        assert!(ValidationUtils::validate_keepers(1, &[a, a]).is_err());
        assert!(ValidationUtils::validate_keepers(1, &[Address::ZERO]).is_err());
    }

    #[test]
    fn test_data_size_validation() {
        assert!(ValidationUtils::validate_data_size(&[0u8; 16]).is_ok());
        assert!(ValidationUtils::validate_data_size(&vec![0u8; MAX_TX_DATA_SIZE + 1]).is_err());
    }
}
