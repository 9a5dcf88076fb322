//! Genesis configuration
//!
//! Describes the token a new ledger is created with. Loaded from a JSON file
//! by the `init` command or built directly from command-line flags.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::token::event::EventSink;
use crate::token::{Address, Amount, TokenLedger};

/// Genesis loading errors
#[derive(Error, Debug)]
pub enum GenesisError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid genesis file: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn default_decimals() -> u8 {
    18
}

/// Parameters of the initial allocation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenesisConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    pub total_supply: Amount,
    /// Account credited with the whole supply
    pub recipient: Address,
}

impl GenesisConfig {
    /// Load a genesis configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, GenesisError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write this configuration as pretty JSON
    pub fn to_file(&self, path: &Path) -> Result<(), GenesisError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Create the ledger described by this configuration
    pub fn build<S: EventSink>(&self, sink: S) -> TokenLedger<S> {
        if self.recipient.is_zero() {
            log::warn!("Genesis recipient is the zero address; the supply is unspendable");
        }

        TokenLedger::init(
            self.recipient,
            self.name.clone(),
            self.symbol.clone(),
            self.decimals,
            self.total_supply,
            sink,
        )
    }
}
