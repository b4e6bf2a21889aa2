//! MediShareNet ledger CLI
//!
//! Operator tool for a ledger persisted in a local data directory.

use clap::{Parser, Subcommand};
use medishare_ledger::cli::{self, parse_cli_amount, AppState};
use medishare_ledger::ledger::GenesisConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "MediShareNet (MSH) token ledger", long_about = None)]
struct Cli {
    /// Data directory for ledger storage
    #[arg(short, long, default_value = ".ledger_data")]
    data_dir: PathBuf,

    /// Print `{ success, value | error }` JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new ledger
    Init {
        /// Genesis configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Owner account (overrides the config file)
        #[arg(long)]
        owner: Option<String>,

        /// Initial supply in display units (overrides the config file)
        #[arg(long)]
        supply: Option<String>,

        /// Replace an existing ledger
        #[arg(long)]
        force: bool,
    },

    /// Display ledger information
    Info,

    /// Show an account balance
    Balance {
        /// Account identifier
        account: String,
    },

    /// List accounts holding tokens
    Holders,

    /// Mint new tokens
    Mint {
        /// Calling account (must be an active minter)
        #[arg(long)]
        caller: String,

        /// Recipient account
        #[arg(short, long)]
        to: String,

        /// Amount in display units (e.g. 1.5)
        #[arg(short, long)]
        amount: String,

        /// Audit note stored with the mint record
        #[arg(short, long, default_value = "")]
        metadata: String,
    },

    /// Transfer tokens
    Transfer {
        /// Calling account
        #[arg(long)]
        caller: String,

        /// Sending account (defaults to the caller)
        #[arg(short, long)]
        from: Option<String>,

        /// Recipient account
        #[arg(short, long)]
        to: String,

        /// Amount in display units
        #[arg(short, long)]
        amount: String,
    },

    /// Burn tokens held by the caller
    Burn {
        #[arg(long)]
        caller: String,

        /// Amount in display units
        #[arg(short, long)]
        amount: String,
    },

    /// Admin role management
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },

    /// Pause mint, transfer and burn
    Pause {
        #[arg(long)]
        caller: String,
    },

    /// Resume mint, transfer and burn
    Unpause {
        #[arg(long)]
        caller: String,
    },

    /// Minter registry
    Minter {
        #[command(subcommand)]
        action: MinterCommands,
    },

    /// Set or clear an account's transfer restriction
    Restrict {
        #[arg(long)]
        caller: String,

        /// Account to flag
        account: String,

        /// Clear the restriction instead of setting it
        #[arg(long)]
        clear: bool,
    },

    /// Show a mint record
    Record {
        /// Mint record id
        id: u64,
    },

    /// List recent mint records
    Records {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Verify ledger invariants
    Verify,

    /// Show storage backups
    Backups,

    /// Restore a backup (0 = most recent)
    Restore {
        #[arg(short, long, default_value = "0")]
        index: usize,
    },

    /// Export ledger snapshot to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import ledger snapshot from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Hand the admin role to another account
    Set {
        #[arg(long)]
        caller: String,

        /// New admin account
        new_admin: String,
    },
}

#[derive(Subcommand)]
enum MinterCommands {
    /// Register a new minter
    Add {
        #[arg(long)]
        caller: String,
        minter: String,
    },

    /// Deactivate a minter (it cannot be added again)
    Remove {
        #[arg(long)]
        caller: String,
        minter: String,
    },

    /// Show whether an account may mint
    Status { account: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Handle init command separately (doesn't need existing state)
    if let Commands::Init {
        config,
        owner,
        supply,
        force,
    } = &cli.command
    {
        let mut genesis = match config {
            Some(path) => GenesisConfig::load(path)?,
            None => GenesisConfig::default(),
        };
        if let Some(owner) = owner {
            genesis.owner = owner.clone();
        }
        if let Some(supply) = supply {
            genesis.initial_supply = parse_cli_amount(supply)?;
        }
        return cli::cmd_init(&cli.data_dir, &genesis, *force);
    }

    // Initialize application state
    let mut state = AppState::new(cli.data_dir.clone(), cli.json)?;

    // Process commands
    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Info => cli::cmd_info(&state)?,

        Commands::Balance { account } => cli::cmd_balance(&state, &account)?,

        Commands::Holders => cli::cmd_holders(&state)?,

        Commands::Mint {
            caller,
            to,
            amount,
            metadata,
        } => {
            let amount = parse_cli_amount(&amount)?;
            cli::cmd_mint(&mut state, &caller, amount, &to, &metadata)?;
        }

        Commands::Transfer {
            caller,
            from,
            to,
            amount,
        } => {
            let amount = parse_cli_amount(&amount)?;
            let sender = from.unwrap_or_else(|| caller.clone());
            cli::cmd_transfer(&mut state, &caller, amount, &sender, &to)?;
        }

        Commands::Burn { caller, amount } => {
            let amount = parse_cli_amount(&amount)?;
            cli::cmd_burn(&mut state, &caller, amount)?;
        }

        Commands::Admin { action } => match action {
            AdminCommands::Set { caller, new_admin } => {
                cli::cmd_set_admin(&mut state, &caller, &new_admin)?;
            }
        },

        Commands::Pause { caller } => cli::cmd_set_paused(&mut state, &caller, true)?,

        Commands::Unpause { caller } => cli::cmd_set_paused(&mut state, &caller, false)?,

        Commands::Minter { action } => match action {
            MinterCommands::Add { caller, minter } => {
                cli::cmd_minter_add(&mut state, &caller, &minter)?;
            }
            MinterCommands::Remove { caller, minter } => {
                cli::cmd_minter_remove(&mut state, &caller, &minter)?;
            }
            MinterCommands::Status { account } => {
                cli::cmd_minter_status(&state, &account)?;
            }
        },

        Commands::Restrict {
            caller,
            account,
            clear,
        } => cli::cmd_restrict(&mut state, &caller, &account, !clear)?,

        Commands::Record { id } => cli::cmd_record(&state, id)?,

        Commands::Records { count } => cli::cmd_records(&state, count)?,

        Commands::Verify => cli::cmd_verify(&state)?,

        Commands::Backups => cli::cmd_backups(&state)?,

        Commands::Restore { index } => cli::cmd_restore(&mut state, index)?,

        Commands::Export { output } => cli::cmd_export(&state, &output)?,

        Commands::Import { input } => cli::cmd_import(&mut state, &input)?,
    }

    Ok(())
}
