//ldc-common/src/types.rs
//! Common type definitions and constants used throughout the ledger

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{LedgerError, LedgerResult};

/// Timestamp in seconds since Unix epoch
pub type Timestamp = u64;

/// Token amount, always non-negative
pub type Amount = BigUint;

/// Address size in bytes
pub const ADDRESS_SIZE: usize = 20;

/// Native token units
pub mod units {
    /// 1 LDC in its smallest unit (nano LDC)
    pub const LDC: u64 = 1_000_000_000;

    /// 1 milli LDC
    pub const MILLI_LDC: u64 = 1_000_000;

    /// Denominator for parts-per-million rates (withdraw fee, interest)
    pub const PPM: u64 = 1_000_000;
}

/// Symbol constraints shared by token and stake symbols
pub mod symbols {
    /// Prefix of fungible token symbols, e.g. `$USD`
    pub const TOKEN_PREFIX: char = '$';

    /// Prefix of stake pool symbols, e.g. `#LDC`
    pub const STAKE_PREFIX: char = '#';

    /// Minimum symbol body length (without prefix)
    pub const MIN_BODY_LEN: usize = 2;

    /// Maximum symbol body length (without prefix)
    pub const MAX_BODY_LEN: usize = 10;
}

/// 20-byte account address
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// The zero address. Used as the "clear" sentinel and as the treasury default.
    pub const ZERO: Address = Address([0u8; ADDRESS_SIZE]);

    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Interprets the address as a right-aligned ASCII symbol, if it is one.
    fn as_symbol_str(&self) -> Option<&str> {
        let start = self.0.iter().position(|&b| b != 0)?;
        std::str::from_utf8(&self.0[start..]).ok()
    }

    /// Returns the stake symbol this address encodes, if any.
    ///
    /// Stake pool accounts live in a reserved address namespace: the address
    /// bytes are the pool symbol right-aligned and zero-padded.
    pub fn as_stake_symbol(&self) -> Option<StakeSymbol> {
        self.as_symbol_str()
            .and_then(|s| StakeSymbol::from_str(s).ok())
    }

    /// Returns the token symbol this address encodes, if any.
    pub fn as_token_symbol(&self) -> Option<TokenSymbol> {
        match self.as_symbol_str() {
            Some(s) if s.starts_with(symbols::TOKEN_PREFIX) => TokenSymbol::from_str(s).ok(),
            _ => None,
        }
    }

    fn from_symbol(symbol: &str) -> Self {
        let bytes = symbol.as_bytes();
        let mut addr = [0u8; ADDRESS_SIZE];
        addr[ADDRESS_SIZE - bytes.len()..].copy_from_slice(bytes);
        Self(addr)
    }
}

impl From<[u8; ADDRESS_SIZE]> for Address {
    fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> LedgerResult<Self> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_str)
            .map_err(|e| LedgerError::validation(format!("invalid address {:?}: {}", s, e)))?;
        let bytes: [u8; ADDRESS_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
            LedgerError::validation(format!(
                "invalid address length: expected {}, got {}",
                ADDRESS_SIZE,
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(de::Error::custom)
    }
}

fn validate_symbol_body(body: &str) -> bool {
    let len = body.len();
    if !(symbols::MIN_BODY_LEN..=symbols::MAX_BODY_LEN).contains(&len) {
        return false;
    }
    let mut chars = body.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Fungible token symbol. The empty symbol is the native token.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenSymbol(String);

impl TokenSymbol {
    /// The native token (LDC)
    pub const NATIVE: TokenSymbol = TokenSymbol(String::new());

    pub fn is_native(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address of the token issuer account.
    pub fn address(&self) -> Address {
        Address::from_symbol(&self.0)
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            f.write_str("LDC")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl fmt::Debug for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenSymbol({})", self)
    }
}

impl FromStr for TokenSymbol {
    type Err = LedgerError;

    fn from_str(s: &str) -> LedgerResult<Self> {
        if s.is_empty() || s == "LDC" {
            return Ok(Self::NATIVE);
        }
        match s.strip_prefix(symbols::TOKEN_PREFIX) {
            Some(body) if validate_symbol_body(body) => Ok(Self(s.to_string())),
            _ => Err(LedgerError::validation(format!("invalid token symbol {:?}", s))),
        }
    }
}

impl Serialize for TokenSymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenSymbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TokenSymbol::from_str(&s).map_err(de::Error::custom)
    }
}

/// Stake pool symbol, e.g. `#LDC`. Maps one-to-one onto a reserved address.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StakeSymbol(String);

impl StakeSymbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address of the stake pool account.
    pub fn address(&self) -> Address {
        Address::from_symbol(&self.0)
    }
}

impl fmt::Display for StakeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for StakeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StakeSymbol({})", self.0)
    }
}

impl FromStr for StakeSymbol {
    type Err = LedgerError;

    fn from_str(s: &str) -> LedgerResult<Self> {
        match s.strip_prefix(symbols::STAKE_PREFIX) {
            Some(body) if validate_symbol_body(body) => Ok(Self(s.to_string())),
            _ => Err(LedgerError::validation(format!("invalid stake symbol {:?}", s))),
        }
    }
}

impl Serialize for StakeSymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StakeSymbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StakeSymbol::from_str(&s).map_err(de::Error::custom)
    }
}

/// Transaction kinds known to the ledger. Also used by account approve lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TxKind {
    Transfer,
    UpdateAccountInfo,
    AddNonceTable,
    CreateStake,
    ResetStake,
    DestroyStake,
    TakeStake,
    WithdrawStake,
    UpdateStakeApprover,
    OpenLending,
    CloseLending,
    Borrow,
    Repay,
}

impl TxKind {
    pub const ALL: [TxKind; 13] = [
        TxKind::Transfer,
        TxKind::UpdateAccountInfo,
        TxKind::AddNonceTable,
        TxKind::CreateStake,
        TxKind::ResetStake,
        TxKind::DestroyStake,
        TxKind::TakeStake,
        TxKind::WithdrawStake,
        TxKind::UpdateStakeApprover,
        TxKind::OpenLending,
        TxKind::CloseLending,
        TxKind::Borrow,
        TxKind::Repay,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TxKind::Transfer => "Transfer",
            TxKind::UpdateAccountInfo => "UpdateAccountInfo",
            TxKind::AddNonceTable => "AddNonceTable",
            TxKind::CreateStake => "CreateStake",
            TxKind::ResetStake => "ResetStake",
            TxKind::DestroyStake => "DestroyStake",
            TxKind::TakeStake => "TakeStake",
            TxKind::WithdrawStake => "WithdrawStake",
            TxKind::UpdateStakeApprover => "UpdateStakeApprover",
            TxKind::OpenLending => "OpenLending",
            TxKind::CloseLending => "CloseLending",
            TxKind::Borrow => "Borrow",
            TxKind::Repay => "Repay",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Already verified signer identities of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Address>", into = "Vec<Address>")]
pub struct Signers(Vec<Address>);

impl Signers {
    /// Builds a signer set; duplicates are collapsed.
    pub fn new(mut signers: Vec<Address>) -> Self {
        signers.sort();
        signers.dedup();
        Self(signers)
    }

    pub fn has(&self, addr: &Address) -> bool {
        self.0.binary_search(addr).is_ok()
    }

    /// Number of distinct keepers present in this signer set.
    pub fn count_keepers(&self, keepers: &[Address]) -> usize {
        let mut seen: Vec<&Address> = keepers.iter().filter(|k| self.has(k)).collect();
        seen.sort();
        seen.dedup();
        seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.0.iter()
    }
}

impl From<Vec<Address>> for Signers {
    fn from(signers: Vec<Address>) -> Self {
        Self::new(signers)
    }
}

impl From<Signers> for Vec<Address> {
    fn from(signers: Signers) -> Self {
        signers.0
    }
}

/// Converts an LDC amount into its smallest unit.
pub fn ldc(amount: u64) -> Amount {
    Amount::from(amount) * Amount::from(units::LDC)
}
