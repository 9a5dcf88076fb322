//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing
//! - secp256k1 key pairs that authenticate callers

pub mod hash;
pub mod keys;

pub use hash::sha256;
pub use keys::{public_key_to_address, KeyError, KeyPair};
