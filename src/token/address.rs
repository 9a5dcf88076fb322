//! Account identities
//!
//! An [`Address`] is an opaque 20-byte account handle. The all-zero address is
//! reserved to mean "no account" and is rejected wherever an operation needs a
//! real owner, spender, sender or recipient.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::crypto::sha256;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Address parsing errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address length: expected {expected} hex characters, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Invalid hex in address: {0}")]
    InvalidHex(String),
}

/// A ledger account identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The reserved zero identity
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Build an address from the trailing 20 bytes of a digest
    ///
    /// Digests shorter than an address are left-padded with zeros.
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        if digest.len() >= ADDRESS_LEN {
            bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
        } else {
            bytes[ADDRESS_LEN - digest.len()..].copy_from_slice(digest);
        }
        Self(bytes)
    }

    /// Deterministic address derived from a label
    pub fn from_seed(seed: &str) -> Self {
        Self::from_digest(&sha256(seed.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
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
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                got: digits.len(),
            });
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

// Addresses serialize as hex strings so they can key JSON maps.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
