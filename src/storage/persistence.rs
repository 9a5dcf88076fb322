//! Ledger persistence layer
//!
//! Saves and loads the ledger state, together with its recent event history,
//! as JSON in a data directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::token::{EventLog, EventSink, LedgerState, TokenLedger};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub ledger_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ledger_data"),
            ledger_file: "ledger.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Everything persisted for one ledger
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub state: LedgerState,
    #[serde(default)]
    pub events: EventLog,
}

impl LedgerSnapshot {
    pub fn from_ledger<S: EventSink + AsRef<EventLog>>(ledger: &TokenLedger<S>) -> Self {
        Self {
            state: ledger.state().clone(),
            events: ledger.sink().as_ref().clone(),
        }
    }

    pub fn into_ledger(self) -> TokenLedger<EventLog> {
        TokenLedger::from_state(self.state, self.events)
    }
}

/// Ledger storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    fn ledger_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.ledger_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.ledger_file, index))
    }

    /// Save the ledger to disk
    pub fn save<S: EventSink + AsRef<EventLog>>(
        &self,
        ledger: &TokenLedger<S>,
    ) -> Result<(), StorageError> {
        let path = self.ledger_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self
            .config
            .data_dir
            .join(format!("{}.tmp", self.config.ledger_file));
        {
            let file = fs::File::create(&temp_path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &LedgerSnapshot::from_ledger(ledger))?;
        }

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!("Ledger saved to {:?}", path);
        Ok(())
    }

    /// Load the ledger from disk
    pub fn load(&self) -> Result<TokenLedger<EventLog>, StorageError> {
        let path = self.ledger_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Ledger file not found".to_string(),
            ));
        }

        read_snapshot(&path)
    }

    /// Check if a saved ledger exists
    pub fn exists(&self) -> bool {
        self.ledger_path().exists()
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<TokenLedger<EventLog>, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_snapshot(&backup_path)
    }

    /// List available backups, newest first
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.ledger_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

fn read_snapshot(path: &Path) -> Result<TokenLedger<EventLog>, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: LedgerSnapshot = serde_json::from_reader(reader)?;
    Ok(snapshot.into_ledger())
}

/// Save a ledger to a specific file path
pub fn save_to_file<S: EventSink + AsRef<EventLog>>(
    ledger: &TokenLedger<S>,
    path: &Path,
) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &LedgerSnapshot::from_ledger(ledger))?;
    Ok(())
}

/// Load a ledger from a specific file path
pub fn load_from_file(path: &Path) -> Result<TokenLedger<EventLog>, StorageError> {
    read_snapshot(path)
}
