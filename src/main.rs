//! Token Ledger CLI Application
//!
//! A command-line interface for creating and operating a token ledger.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use token_ledger::cli::{self, AppState};
use token_ledger::token::{Address, Amount, GenesisConfig};

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A fixed-supply fungible token ledger", long_about = None)]
struct Cli {
    /// Data directory for ledger storage
    #[arg(short, long, default_value = ".ledger_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ledger, minting the whole supply to one account
    Init {
        /// Genesis file (JSON); overrides the individual flags
        #[arg(short, long)]
        genesis: Option<PathBuf>,

        /// Token name
        #[arg(long, default_value = "Token")]
        name: String,

        /// Token symbol
        #[arg(long, default_value = "TKN")]
        symbol: String,

        /// Display decimals
        #[arg(long, default_value = "18")]
        decimals: u8,

        /// Total supply in base units
        #[arg(long)]
        supply: Option<Amount>,

        /// Account receiving the supply
        #[arg(long)]
        recipient: Option<Address>,

        /// Replace an existing ledger
        #[arg(long)]
        force: bool,
    },

    /// Account operations
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Display token information
    Info,

    /// Show the balance of an account
    Balance {
        #[arg(short, long)]
        address: Address,
    },

    /// Show how much a spender may move for an owner
    Allowance {
        #[arg(short, long)]
        owner: Address,

        #[arg(short, long)]
        spender: Address,
    },

    /// List holders by balance
    Holders {
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Transfer tokens to an account
    Transfer {
        /// Caller's private key (hex)
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        to: Address,

        #[arg(short, long)]
        amount: Amount,
    },

    /// Set the allowance of a spender
    Approve {
        /// Caller's private key (hex)
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        spender: Address,

        #[arg(short, long)]
        amount: Amount,
    },

    /// Delegated transfer out of a sender's account
    TransferFrom {
        /// Caller's private key (hex)
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        sender: Address,

        #[arg(short, long)]
        to: Address,

        #[arg(short, long)]
        amount: Amount,
    },

    /// Raise the allowance of a spender
    IncreaseAllowance {
        /// Caller's private key (hex)
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        spender: Address,

        #[arg(short, long)]
        amount: Amount,
    },

    /// Lower the allowance of a spender
    DecreaseAllowance {
        /// Caller's private key (hex)
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        spender: Address,

        #[arg(short, long)]
        amount: Amount,
    },

    /// Show recent events
    Events {
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Only show transfers to or from this account
        #[arg(short, long)]
        address: Option<Address>,
    },

    /// Restore the ledger from a backup (0 is the newest)
    Restore {
        #[arg(short, long, default_value = "0")]
        backup: usize,
    },

    /// Export ledger to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import ledger from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Generate a new key and its address
    New,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need a loaded ledger
    match &cli.command {
        Commands::Init {
            genesis,
            name,
            symbol,
            decimals,
            supply,
            recipient,
            force,
        } => {
            let genesis = match genesis {
                Some(path) => GenesisConfig::from_file(path)?,
                None => GenesisConfig {
                    name: name.clone(),
                    symbol: symbol.clone(),
                    decimals: *decimals,
                    total_supply: supply.ok_or("--supply is required without --genesis")?,
                    recipient: recipient.ok_or("--recipient is required without --genesis")?,
                },
            };
            return cli::cmd_init(&cli.data_dir, &genesis, *force);
        }
        Commands::Account { action } => {
            return match action {
                AccountCommands::New => cli::cmd_account_new(),
            };
        }
        _ => {}
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. } | Commands::Account { .. } => unreachable!(),

        Commands::Info => cli::cmd_info(&state)?,

        Commands::Balance { address } => cli::cmd_balance(&state, &address)?,

        Commands::Allowance { owner, spender } => cli::cmd_allowance(&state, &owner, &spender)?,

        Commands::Holders { count } => cli::cmd_holders(&state, count)?,

        Commands::Transfer { key, to, amount } => {
            cli::cmd_transfer(&mut state, &key, &to, amount)?;
        }

        Commands::Approve {
            key,
            spender,
            amount,
        } => {
            cli::cmd_approve(&mut state, &key, &spender, amount)?;
        }

        Commands::TransferFrom {
            key,
            sender,
            to,
            amount,
        } => {
            cli::cmd_transfer_from(&mut state, &key, &sender, &to, amount)?;
        }

        Commands::IncreaseAllowance {
            key,
            spender,
            amount,
        } => {
            cli::cmd_increase_allowance(&mut state, &key, &spender, amount)?;
        }

        Commands::DecreaseAllowance {
            key,
            spender,
            amount,
        } => {
            cli::cmd_decrease_allowance(&mut state, &key, &spender, amount)?;
        }

        Commands::Events { count, address } => cli::cmd_events(&state, count, address.as_ref())?,

        Commands::Restore { backup } => cli::cmd_restore(&mut state, backup)?,

        Commands::Export { output } => cli::cmd_export(&state, &output)?,

        Commands::Import { input } => cli::cmd_import(&mut state, &input)?,
    }

    Ok(())
}
