//! ERC-20 style fungible token ledger
//!
//! Provides a single fixed-supply token with:
//! - Balances per address
//! - Allowances keyed by (owner, spender)
//! - Transfer, approve, transfer-from and allowance adjustment operations
//! - Event delivery through an injected [`EventSink`]
//!
//! # Example
//!
//! ```
//! use token_ledger::token::{Address, LedgerEvent, TokenLedger};
//!
//! let alice = Address::from_seed("alice");
//! let bob = Address::from_seed("bob");
//!
//! let mut ledger = TokenLedger::init(alice, "My Token", "MTK", 18, 1000, Vec::<LedgerEvent>::new());
//! ledger.transfer(&alice, &bob, 400).unwrap();
//!
//! assert_eq!(ledger.balance_of(&alice), 600);
//! assert_eq!(ledger.balance_of(&bob), 400);
//! assert_eq!(ledger.sink().len(), 1);
//! ```

pub mod address;
pub mod error;
pub mod event;
pub mod genesis;
pub mod ledger;
pub mod shared;

/// Token amount in base units
pub type Amount = u128;

pub use address::{Address, AddressError};
pub use error::TokenError;
pub use event::{
    ApprovalEvent, EventLog, EventSink, LedgerEvent, LogSink, NullSink, RecordedEvent, Tee,
    TransferEvent,
};
pub use genesis::{GenesisConfig, GenesisError};
pub use ledger::{AllowanceKey, LedgerState, SupplyReport, TokenLedger, TokenMetadata};
pub use shared::SharedLedger;
