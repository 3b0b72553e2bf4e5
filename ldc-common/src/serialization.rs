// Standard data transfer and serialization patterns for the ledger
// This module provides standardized encoding/decoding for persisted types

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::LedgerError;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SerializationError> for LedgerError {
    fn from(err: SerializationError) -> Self {
        LedgerError::serialization(err.to_string())
    }
}

/// Standard encoding types used throughout the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingType {
    /// Compact binary encoding for state persistence
    Bincode,
    /// Human-readable format for configuration, payloads and snapshots
    Json,
}

/// Trait for standardized serialization across all ledger types
pub trait LedgerSerialize: Serialize + DeserializeOwned {
    /// Get the preferred encoding type for this data structure
    fn preferred_encoding() -> EncodingType;

    /// Serialize using the preferred encoding
    fn encode(&self) -> Result<Vec<u8>, SerializationError> {
        self.encode_as(Self::preferred_encoding())
    }

    /// Serialize using a specific encoding
    fn encode_as(&self, encoding: EncodingType) -> Result<Vec<u8>, SerializationError> {
        match encoding {
            EncodingType::Bincode => Ok(bincode::serialize(self)?),
            EncodingType::Json => Ok(serde_json::to_vec(self)?),
        }
    }

    /// Deserialize using the preferred encoding
    fn decode(bytes: &[u8]) -> Result<Self, SerializationError> {
        Self::decode_as(bytes, Self::preferred_encoding())
    }

    /// Deserialize using a specific encoding
    fn decode_as(bytes: &[u8], encoding: EncodingType) -> Result<Self, SerializationError> {
        match encoding {
            EncodingType::Bincode => Ok(bincode::deserialize(bytes)?),
            EncodingType::Json => Ok(serde_json::from_slice(bytes)?),
        }
    }
}

/// Hash computation utilities with standardized patterns
pub struct HashCompute;

impl HashCompute {
    /// Compute SHA-256 hash of serialized data
    pub fn hash_data<T: LedgerSerialize>(data: &T) -> Result<[u8; 32], SerializationError> {
        let encoded = data.encode()?;
        Ok(Sha256::digest(&encoded).into())
    }

    /// Compute hash of raw bytes
    pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }
}
