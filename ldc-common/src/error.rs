//ldc-common/src/error.rs
//! Standardized error types for all ledger components

use std::sync::{MutexGuard, PoisonError};
use thiserror::Error;

use crate::types::{Address, Amount, TokenSymbol, TxKind};

/// Standard result type used throughout the ledger
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Error taxonomy. Every concrete error resolves to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidAccountType,
    NotFound,
    AlreadyExists,
    ImmutableFieldChanged,
    Locked,
    OutOfRange,
    InsufficientFunds,
    AuthorizationFailure,
    InvariantViolation,
    Invalid,
    Internal,
}

/// Account level failures raised by the balance, staking, lending and
/// authorization methods of an account.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("invalid stake account")]
    InvalidStakeAccount,

    #[error("stake account already exists")]
    StakeAccountExists,

    #[error("invalid ledger")]
    InvalidLedger,

    #[error("can't change stake type, expected {expected}, got {got}")]
    StakeTypeImmutable { expected: u16, got: u16 },

    #[error("can't change stake token, expected {expected}, got {got}")]
    StakeTokenImmutable {
        expected: TokenSymbol,
        got: TokenSymbol,
    },

    #[error("stake in lock, please retry after lockTime, Unix({0})")]
    StakeLocked(u64),

    #[error("stake entry in lock, please retry after lockTime, Unix({0})")]
    EntryLocked(u64),

    #[error("stake ledger has {0} holders, expected at most 1")]
    TooManyHolders(usize),

    #[error("recipient mismatch, expected {expected}, got {got}")]
    RecipientMismatch { expected: Address, got: Address },

    #[error("stake ledger not empty, {0} holders remain")]
    LedgerNotEmpty(usize),

    #[error("invalid token, expected {expected}, got {got}")]
    InvalidToken {
        expected: TokenSymbol,
        got: TokenSymbol,
    },

    #[error("invalid amount, expected >= {min}, got {got}")]
    AmountBelowMinimum { min: Amount, got: Amount },

    #[error("invalid total amount, expected <= {max}, got {got}")]
    AmountAboveMaximum { max: Amount, got: Amount },

    #[error("invalid pledge, expected >= {min}, got {got}")]
    PledgeBelowMinimum { min: Amount, got: Amount },

    #[error("invalid lockTime, expected > {pool}, got {got}")]
    LockTimeNotAfterPoolLock { pool: u64, got: u64 },

    #[error("invalid lockTime, expected 0 or > {now}, got {got}")]
    LockTimeInPast { now: u64, got: u64 },

    #[error("insufficient stake to withdraw, expected {requested}, got {available}")]
    InsufficientStake { available: Amount, requested: Amount },

    #[error("insufficient pool balance to withdraw, expected {requested}, got {available}")]
    InsufficientPoolBalance { available: Amount, requested: Amount },

    #[error("insufficient {token} balance, expected {requested}, got {available}")]
    InsufficientBalance {
        token: TokenSymbol,
        available: Amount,
        requested: Amount,
    },

    #[error("{0} has no stake ledger entry")]
    NoStakeEntry(Address),

    #[error("stake entry approver {0} must sign")]
    ApproverSignatureRequired(Address),

    #[error("need more signatures for {0}")]
    InsufficientSignatures(TxKind),

    #[error("invalid nonce, expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("nonce {nonce} not exists at {expire}")]
    NonceNotFound { expire: u64, nonce: u64 },

    #[error("nonce table entry expired at {0}")]
    NonceExpired(u64),

    #[error("invalid tx kind {kind} for {account} account")]
    InvalidTxKind { kind: TxKind, account: &'static str },

    #[error("lending exists")]
    LendingExists,

    #[error("lending not opened")]
    LendingNotOpened,

    #[error("lending not closed, {0} borrowers remain")]
    LendingNotClosed(usize),

    #[error("{0} has no lending entry")]
    NoLendingEntry(Address),
}

impl AccountError {
    /// Taxonomy kind of this failure
    pub fn kind(&self) -> ErrorKind {
        use AccountError::*;
        match self {
            InvalidStakeAccount | InvalidTxKind { .. } => ErrorKind::InvalidAccountType,
            NoStakeEntry(_) | NonceNotFound { .. } | LendingNotOpened | NoLendingEntry(_) => {
                ErrorKind::NotFound
            }
            StakeAccountExists | LendingExists => ErrorKind::AlreadyExists,
            StakeTypeImmutable { .. } | StakeTokenImmutable { .. } => {
                ErrorKind::ImmutableFieldChanged
            }
            StakeLocked(_) | EntryLocked(_) | NonceExpired(_) => ErrorKind::Locked,
            AmountBelowMinimum { .. }
            | AmountAboveMaximum { .. }
            | PledgeBelowMinimum { .. }
            | LockTimeNotAfterPoolLock { .. }
            | LockTimeInPast { .. } => ErrorKind::OutOfRange,
            InsufficientStake { .. }
            | InsufficientPoolBalance { .. }
            | InsufficientBalance { .. } => ErrorKind::InsufficientFunds,
            ApproverSignatureRequired(_) | InsufficientSignatures(_) => {
                ErrorKind::AuthorizationFailure
            }
            TooManyHolders(_)
            | RecipientMismatch { .. }
            | LedgerNotEmpty(_)
            | LendingNotClosed(_)
            | NonceMismatch { .. } => ErrorKind::InvariantViolation,
            InvalidToken { .. } => ErrorKind::Invalid,
            InvalidLedger => ErrorKind::Internal,
        }
    }
}

/// Comprehensive error type for all ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    // Account level errors
    #[error(transparent)]
    Account(#[from] AccountError),

    // Error annotated with the account/operation it originated from
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<LedgerError>,
    },

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    // Poisoned account lock
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    // I/O errors
    #[error("I/O error: {0}")]
    IO(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wraps this error with the originating account/operation
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context wrappers
    pub fn root(&self) -> &LedgerError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// The account error at the root of this error, if any
    pub fn account_error(&self) -> Option<&AccountError> {
        match self.root() {
            Self::Account(err) => Some(err),
            _ => None,
        }
    }

    /// Taxonomy kind of the root cause
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::Account(err) => err.kind(),
            Self::Validation(_) | Self::Serialization(_) | Self::Json(_) | Self::Config(_) => {
                ErrorKind::Invalid
            }
            _ => ErrorKind::Internal,
        }
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for LedgerError {
    fn from(err: PoisonError<MutexGuard<'_, T>>) -> Self {
        LedgerError::LockPoisoned(err.to_string())
    }
}

/// Extension for annotating results with the originating operation
pub trait ResultExt<T> {
    /// Wraps the error, if any, with a context produced on demand
    fn with_context<F, C>(self, f: F) -> LedgerResult<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<LedgerError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, C>(self, f: F) -> LedgerResult<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| e.into().context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_resolves_root_kind() {
        let err: LedgerResult<()> = Err(AccountError::StakeLocked(42).into());
        let err = err
            .with_context(|| "Account(0x00).ResetStake")
            .with_context(|| "ResetStake.apply")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Locked);
        assert_eq!(err.account_error(), Some(&AccountError::StakeLocked(42)));
        assert_eq!(
            err.to_string(),
            "ResetStake.apply: Account(0x00).ResetStake: stake in lock, please retry after lockTime, Unix(42)"
        );
    }
}
