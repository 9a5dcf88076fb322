//! CLI commands for the ledger
//!
//! Implements all command handlers for the CLI interface. Mutating commands
//! authenticate the caller with a private key; the derived address is the
//! identity the ledger sees.

use crate::crypto::KeyPair;
use crate::storage::{Storage, StorageConfig};
use crate::token::{
    Address, Amount, EventLog, GenesisConfig, LedgerEvent, LogSink, Tee, TokenError, TokenLedger,
};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Ledger whose events are both recorded and written to the log
pub type CliLedger = TokenLedger<Tee<EventLog, LogSink>>;

fn with_event_logging(ledger: TokenLedger<EventLog>) -> CliLedger {
    ledger.map_sink(|events| Tee(events, LogSink))
}

/// Application state
pub struct AppState {
    pub ledger: CliLedger,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the ledger from the data directory
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "No ledger found in {:?}. Create one with: ledger init",
                data_dir
            )
            .into());
        }

        let ledger = with_event_logging(storage.load()?);

        Ok(Self {
            ledger,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.ledger)?;
        Ok(())
    }

    /// Persist after a successful operation, report a rejected one
    fn commit(&self, operation: &str, result: Result<(), TokenError>) -> CliResult<()> {
        match result {
            Ok(()) => {
                self.save()?;
                Ok(())
            }
            Err(e) => {
                log::warn!("{} rejected: {}", operation, e);
                println!("❌ {} rejected: {}", operation, e);
                Err(e.into())
            }
        }
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(storage_config)?)
}

/// Authenticate the caller from a hex private key
pub fn caller_from_key(private_key_hex: &str) -> CliResult<Address> {
    let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
    Ok(key_pair.address())
}

/// Initialize a new ledger
pub fn cmd_init(data_dir: &Path, genesis: &GenesisConfig, force: bool) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Ledger already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let ledger = genesis.build(Tee(EventLog::new(), LogSink));
    storage.save(&ledger)?;

    println!("✅ Ledger initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🪙 Token: {} ({})", ledger.name(), ledger.symbol());
    println!("   🔢 Decimals: {}", ledger.decimals());
    println!("   💰 Total supply: {}", ledger.total_supply());
    println!("   📍 Recipient: {}", genesis.recipient);

    Ok(())
}

/// Generate a new account key
pub fn cmd_account_new() -> CliResult<()> {
    let key_pair = KeyPair::generate();

    println!("🔐 New account created!");
    println!("   📍 Address: {}", key_pair.address());
    println!("   🔑 Private key: {}", key_pair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: The private key is not stored anywhere.");
    println!("   Keep it safe; it is the only way to act as this account.");

    Ok(())
}

/// Display ledger info
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let ledger = &state.ledger;
    let report = ledger.supply_report();
    let stats = state.storage.stats()?;

    println!("🪙 Token Info");
    println!("   ├─ Name: {}", ledger.name());
    println!("   ├─ Symbol: {}", ledger.symbol());
    println!("   ├─ Decimals: {}", ledger.decimals());
    println!("   ├─ Total supply: {}", report.total_supply);
    println!("   ├─ Holders: {}", ledger.holder_count());
    println!("   ├─ Sum of balances: {}", report.balance_sum);
    println!("   ├─ Outstanding allowances: {}", report.allowance_sum);
    println!("   ├─ Events recorded: {}", ledger.sink().0.total_recorded());
    println!("   ├─ Created: {}", ledger.metadata().created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("   └─ Storage: {} bytes, {} backups", stats.file_size, stats.backup_count);

    if !report.reconciles {
        println!("\n   ⚠️  Balances do not add up to the total supply");
    }

    Ok(())
}

/// Show an account balance
pub fn cmd_balance(state: &AppState, address: &Address) -> CliResult<()> {
    let balance = state.ledger.balance_of(address);
    println!("💰 Balance for {}", address);
    println!("   {} {}", balance, state.ledger.symbol());
    Ok(())
}

/// Show an allowance
pub fn cmd_allowance(state: &AppState, owner: &Address, spender: &Address) -> CliResult<()> {
    let allowance = state.ledger.allowance(owner, spender);
    println!("🤝 Allowance");
    println!("   ├─ Owner: {}", owner);
    println!("   ├─ Spender: {}", spender);
    println!("   └─ Amount: {} {}", allowance, state.ledger.symbol());
    Ok(())
}

/// List holders by balance
pub fn cmd_holders(state: &AppState, count: usize) -> CliResult<()> {
    let holders = state.ledger.holders();

    if holders.is_empty() {
        println!("📭 No holders");
        return Ok(());
    }

    println!("📋 Holders ({}):", holders.len());
    for (address, balance) in holders.iter().take(count) {
        println!("   {} - {}", address, balance);
    }
    if holders.len() > count {
        println!("   ... and {} more", holders.len() - count);
    }

    Ok(())
}

/// Transfer tokens from the caller
pub fn cmd_transfer(state: &mut AppState, key: &str, to: &Address, amount: Amount) -> CliResult<()> {
    let caller = caller_from_key(key)?;
    let result = state.ledger.transfer(&caller, to, amount);
    state.commit("Transfer", result)?;

    println!("📤 Transfer complete");
    println!("   From: {}", caller);
    println!("   To: {}", to);
    println!("   Amount: {}", amount);
    println!("   New balance: {}", state.ledger.balance_of(&caller));
    Ok(())
}

/// Set an allowance
pub fn cmd_approve(state: &mut AppState, key: &str, spender: &Address, amount: Amount) -> CliResult<()> {
    let caller = caller_from_key(key)?;
    let result = state.ledger.approve(&caller, spender, amount);
    state.commit("Approve", result)?;

    println!("✅ Allowance for {} set to {}", spender, amount);
    Ok(())
}

/// Delegated transfer
pub fn cmd_transfer_from(
    state: &mut AppState,
    key: &str,
    sender: &Address,
    to: &Address,
    amount: Amount,
) -> CliResult<()> {
    let caller = caller_from_key(key)?;
    let result = state.ledger.transfer_from(&caller, sender, to, amount);
    state.commit("Transfer-from", result)?;

    println!("📤 Transfer-from applied");
    println!("   Allowance {} -> {}: {}", sender, to, state.ledger.allowance(sender, to));
    Ok(())
}

/// Raise an allowance
pub fn cmd_increase_allowance(
    state: &mut AppState,
    key: &str,
    spender: &Address,
    amount: Amount,
) -> CliResult<()> {
    let caller = caller_from_key(key)?;
    let result = state.ledger.increase_allowance(&caller, spender, amount);
    state.commit("Increase allowance", result)?;

    println!("✅ Allowance for {} is now {}", spender, state.ledger.allowance(&caller, spender));
    println!("   Balance: {}", state.ledger.balance_of(&caller));
    Ok(())
}

/// Lower an allowance
pub fn cmd_decrease_allowance(
    state: &mut AppState,
    key: &str,
    spender: &Address,
    amount: Amount,
) -> CliResult<()> {
    let caller = caller_from_key(key)?;
    let result = state.ledger.decrease_allowance(&caller, spender, amount);
    state.commit("Decrease allowance", result)?;

    println!("✅ Allowance for {} is now {}", spender, state.ledger.allowance(&caller, spender));
    println!("   Balance: {}", state.ledger.balance_of(&caller));
    Ok(())
}

/// Show recent events, or the recorded transfers of one account
pub fn cmd_events(state: &AppState, count: usize, address: Option<&Address>) -> CliResult<()> {
    let log = &state.ledger.sink().0;

    if let Some(address) = address {
        let transfers = log.transfers_for(address);
        if transfers.is_empty() {
            println!("📭 No recorded transfers for {}", address);
            return Ok(());
        }

        let skip = transfers.len().saturating_sub(count);
        println!("📜 Recorded transfers for {}:", address);
        for t in transfers.iter().skip(skip) {
            let direction = if t.from == *address { "out" } else { "in " };
            println!("   {} | {} -> {} : {}", direction, t.from, t.to, t.amount);
        }
        return Ok(());
    }

    let events = log.recent(count);

    if events.is_empty() {
        println!("📭 No events recorded");
        return Ok(());
    }

    println!("📜 Recent events:");
    for record in events {
        let when = record.recorded_at.format("%Y-%m-%d %H:%M:%S");
        match &record.event {
            LedgerEvent::Transfer(t) => println!(
                "   #{} | {} | Transfer {} -> {} : {}",
                record.sequence, when, t.from, t.to, t.amount
            ),
            LedgerEvent::Approval(a) => println!(
                "   #{} | {} | Approval {} allows {} : {}",
                record.sequence, when, a.owner, a.spender, a.amount
            ),
        }
    }

    Ok(())
}

/// Export ledger to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.ledger, path)?;
    println!("📦 Ledger exported to {:?}", path);
    Ok(())
}

/// Import ledger from file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    let ledger = crate::storage::load_from_file(path)?;

    if !ledger.supply_report().reconciles {
        log::warn!("Imported ledger balances do not add up to its total supply");
    }

    state.ledger = with_event_logging(ledger);
    state.save()?;

    println!("📥 Ledger imported from {:?}", path);
    println!("   Token: {} ({})", state.ledger.name(), state.ledger.symbol());

    Ok(())
}

/// Replace the current ledger with one of its backups
pub fn cmd_restore(state: &mut AppState, backup: usize) -> CliResult<()> {
    let available = state.storage.list_backups();
    if available.is_empty() {
        println!("📭 No backups found in {:?}", state.data_dir);
        return Ok(());
    }

    let ledger = state.storage.restore_backup(backup)?;
    state.ledger = with_event_logging(ledger);
    state.save()?;

    println!("♻️  Ledger restored from backup {}", backup);
    println!("   Events recorded: {}", state.ledger.sink().0.total_recorded());

    Ok(())
}
