//! Token Ledger: a fixed-supply fungible token ledger in Rust
//!
//! This crate provides the bookkeeping core of an ERC-20 style token:
//! - Balances and (owner, spender) allowances with checked arithmetic
//! - Transfer, approve, transfer-from and allowance adjustment operations
//! - Transfer/Approval events delivered to a pluggable sink
//! - A lock-guarded shared handle for multi-threaded hosts
//! - JSON persistence with backups
//! - secp256k1 keys that authenticate callers in the CLI
//!
//! # Example
//!
//! ```rust
//! use token_ledger::token::{Address, TokenError, TokenLedger};
//!
//! let alice = Address::from_seed("alice");
//! let bob = Address::from_seed("bob");
//!
//! let mut ledger = TokenLedger::new(alice, "My Token", "MTK", 18, 1000);
//! ledger.transfer(&alice, &bob, 400).unwrap();
//!
//! let result = ledger.transfer(&bob, &alice, 2000);
//! assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
//! assert_eq!(ledger.balance_of(&bob), 400);
//! ```

pub mod cli;
pub mod crypto;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use crypto::KeyPair;
pub use storage::{Storage, StorageConfig};
pub use token::{
    Address, Amount, EventLog, EventSink, LedgerEvent, SharedLedger, TokenError, TokenLedger,
};
