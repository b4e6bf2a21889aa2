//! CLI commands for the ledger
//!
//! Implements all command handlers for the CLI interface.

use crate::ledger::{
    format_amount, parse_amount, GenesisConfig, Ledger, LedgerResult, SystemClock,
};
use crate::service::Response;
use crate::storage::{Storage, StorageConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub ledger: Ledger,
    pub storage: Storage,
    pub data_dir: PathBuf,
    /// Print tagged JSON envelopes instead of human-readable text
    pub json: bool,
}

impl AppState {
    /// Initialize application state
    pub fn new(data_dir: PathBuf, json: bool) -> CliResult<Self> {
        let storage = Storage::new(storage_config(&data_dir))?;

        // Load or create ledger
        let ledger = if storage.exists() {
            log::debug!("Loading existing ledger from {:?}", data_dir);
            Ledger::from_state(storage.load()?, Arc::new(SystemClock))?
        } else {
            log::info!("No ledger found, creating one with default genesis");
            let ledger = Ledger::new();
            storage.save(ledger.state())?;
            ledger
        };

        Ok(Self {
            ledger,
            storage,
            data_dir,
            json,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(self.ledger.state())?;
        Ok(())
    }

    /// Report the outcome of a mutation and persist it if it was applied
    fn commit<T: Serialize + Clone>(
        &self,
        result: LedgerResult<T>,
        on_success: impl FnOnce(&T),
    ) -> CliResult<()> {
        if self.json {
            print_json(&Response::from(result.clone()))?;
        }

        match result {
            Ok(value) => {
                self.save()?;
                if !self.json {
                    on_success(&value);
                }
                Ok(())
            }
            Err(e) => {
                if !self.json {
                    println!("❌ Rejected: {} (code {} {})", e, e.code(), e.kind());
                }
                Err(e.into())
            }
        }
    }

    /// Report a read-only value
    fn show<T: Serialize>(&self, value: T, human: impl FnOnce(&T)) -> CliResult<()> {
        if self.json {
            print_json(&Response::ok(value))?;
        } else {
            human(&value);
        }
        Ok(())
    }
}

fn storage_config(data_dir: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a display amount (`"1.5"`) into base units
pub fn parse_cli_amount(input: &str) -> CliResult<u128> {
    Ok(parse_amount(input)?)
}

/// Initialize a new ledger
pub fn cmd_init(data_dir: &Path, genesis: &GenesisConfig, force: bool) -> CliResult<()> {
    let storage = Storage::new(storage_config(data_dir))?;

    if storage.exists() && !force {
        println!("⚠️  Ledger already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will replace existing data)");
        return Ok(());
    }

    let ledger = Ledger::with_genesis(genesis, Arc::new(SystemClock))?;
    storage.save(ledger.state())?;

    println!("✅ Ledger initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   👑 Owner / admin: {}", genesis.owner);
    println!(
        "   💰 Initial supply: {} {}",
        format_amount(genesis.initial_supply),
        ledger.symbol()
    );

    Ok(())
}

#[derive(Serialize)]
struct LedgerInfo<'a> {
    name: &'a str,
    symbol: &'a str,
    decimals: u8,
    total_supply: String,
    admin: &'a str,
    owner: &'a str,
    paused: bool,
    mint_count: u64,
    holders: usize,
    digest: String,
}

/// Display ledger info
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let ledger = state.ledger.state();
    let info = LedgerInfo {
        name: ledger.name(),
        symbol: ledger.symbol(),
        decimals: ledger.decimals(),
        total_supply: ledger.total_supply().to_string(),
        admin: ledger.admin(),
        owner: ledger.owner(),
        paused: ledger.is_paused(),
        mint_count: ledger.mint_count(),
        holders: ledger.holders().len(),
        digest: ledger.digest(),
    };

    state.show(info, |info| {
        println!("🪙  {} ({})", info.name, info.symbol);
        println!("   ├─ Decimals: {}", info.decimals);
        println!(
            "   ├─ Total supply: {}",
            format_amount(ledger.total_supply())
        );
        println!("   ├─ Admin: {}", info.admin);
        println!("   ├─ Owner: {}", info.owner);
        println!("   ├─ Paused: {}", info.paused);
        println!("   ├─ Mint records: {}", info.mint_count);
        println!("   ├─ Holders: {}", info.holders);
        println!("   └─ State digest: {}...", &info.digest[..32]);
    })
}

/// Show an account's balance
pub fn cmd_balance(state: &AppState, account: &str) -> CliResult<()> {
    let balance = state.ledger.balance_of(account);
    state.show(balance.to_string(), |_| {
        println!("💰 Balance for {}", account);
        println!(
            "   {} {} ({} base units)",
            format_amount(balance),
            state.ledger.symbol(),
            balance
        );
        if state.ledger.transfer_restriction(account) {
            println!("   ⛔ Outgoing transfers are restricted");
        }
    })
}

/// List accounts holding tokens
pub fn cmd_holders(state: &AppState) -> CliResult<()> {
    let holders: Vec<(String, String)> = state
        .ledger
        .state()
        .holders()
        .into_iter()
        .map(|(account, balance)| (account.to_string(), balance.to_string()))
        .collect();

    state.show(holders, |holders| {
        println!("📋 Holders:");
        for (account, balance) in holders {
            let units: u128 = balance.parse().unwrap_or(0);
            println!("   {} - {}", account, format_amount(units));
        }
    })
}

/// Mint tokens
pub fn cmd_mint(
    state: &mut AppState,
    caller: &str,
    amount: u128,
    recipient: &str,
    metadata: &str,
) -> CliResult<()> {
    let result = state.ledger.mint(caller, amount, recipient, metadata);
    state.commit(result, |id| {
        println!("✅ Minted {} to {}", format_amount(amount), recipient);
        println!("   🧾 Mint record #{}", id);
    })
}

/// Transfer tokens
pub fn cmd_transfer(
    state: &mut AppState,
    caller: &str,
    amount: u128,
    sender: &str,
    recipient: &str,
) -> CliResult<()> {
    let result = state.ledger.transfer(caller, amount, sender, recipient);
    state.commit(result.map(|_| true), |_| {
        println!("📤 Transferred {}", format_amount(amount));
        println!("   From: {}", sender);
        println!("   To: {}", recipient);
    })
}

/// Burn tokens held by the caller
pub fn cmd_burn(state: &mut AppState, caller: &str, amount: u128) -> CliResult<()> {
    let result = state.ledger.burn(caller, amount);
    let remaining = state.ledger.balance_of(caller);
    state.commit(result.map(|_| true), |_| {
        println!("🔥 Burned {} from {}", format_amount(amount), caller);
        println!("   Remaining balance: {}", format_amount(remaining));
    })
}

/// Hand the admin role to another account
pub fn cmd_set_admin(state: &mut AppState, caller: &str, new_admin: &str) -> CliResult<()> {
    let result = state.ledger.set_admin(caller, new_admin);
    state.commit(result.map(|_| true), |_| {
        println!("👑 Admin is now {}", new_admin);
    })
}

/// Pause or unpause the ledger
pub fn cmd_set_paused(state: &mut AppState, caller: &str, paused: bool) -> CliResult<()> {
    let result = if paused {
        state.ledger.pause(caller)
    } else {
        state.ledger.unpause(caller)
    };
    state.commit(result.map(|_| true), |_| {
        if paused {
            println!("⏸️  Ledger paused");
        } else {
            println!("▶️  Ledger unpaused");
        }
    })
}

/// Register a minter
pub fn cmd_minter_add(state: &mut AppState, caller: &str, minter: &str) -> CliResult<()> {
    let result = state.ledger.add_minter(caller, minter);
    state.commit(result.map(|_| true), |_| {
        println!("✅ {} can now mint", minter);
    })
}

/// Deactivate a minter
pub fn cmd_minter_remove(state: &mut AppState, caller: &str, minter: &str) -> CliResult<()> {
    let result = state.ledger.remove_minter(caller, minter);
    state.commit(result.map(|_| true), |_| {
        println!("🚫 {} can no longer mint", minter);
        println!("   Note: removed minters cannot be registered again.");
    })
}

/// Show whether an account may mint
pub fn cmd_minter_status(state: &AppState, account: &str) -> CliResult<()> {
    let active = state.ledger.is_minter(account);
    state.show(active, |active| {
        if *active {
            println!("✅ {} is an active minter", account);
        } else {
            println!("➖ {} is not an active minter", account);
        }
    })
}

/// Flag or clear an account's transfer restriction
pub fn cmd_restrict(
    state: &mut AppState,
    caller: &str,
    account: &str,
    restricted: bool,
) -> CliResult<()> {
    let result = state
        .ledger
        .set_transfer_restriction(caller, account, restricted);
    state.commit(result.map(|_| true), |_| {
        if restricted {
            println!("⛔ Transfers from {} are restricted", account);
        } else {
            println!("✅ Transfers from {} are allowed", account);
        }
    })
}

/// Show a single mint record
pub fn cmd_record(state: &AppState, id: u64) -> CliResult<()> {
    let record = state.ledger.mint_record(id).cloned();
    state.show(record, |record| match record {
        Some(r) => {
            println!("🧾 Mint record #{}", id);
            println!("   ├─ Amount: {}", format_amount(r.amount));
            println!("   ├─ Recipient: {}", r.recipient);
            println!("   ├─ Metadata: {}", r.metadata);
            println!("   └─ Created: {}", r.created_at.format("%Y-%m-%d %H:%M:%S"));
        }
        None => println!("📭 No mint record #{}", id),
    })
}

/// List recent mint records
pub fn cmd_records(state: &AppState, count: usize) -> CliResult<()> {
    let ledger = state.ledger.state();
    let skip = (ledger.mint_count() as usize).saturating_sub(count);
    let records: Vec<_> = ledger
        .mint_records()
        .skip(skip)
        .map(|(id, r)| (id, r.clone()))
        .collect();

    state.show(records, |records| {
        if records.is_empty() {
            println!("📭 No mint records yet");
            return;
        }
        println!("🧾 Recent mint records:");
        for (id, r) in records.iter().rev() {
            println!(
                "   #{} | {} | {} | {}",
                id,
                format_amount(r.amount),
                r.recipient,
                r.created_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    })
}

/// Validate the stored ledger
pub fn cmd_verify(state: &AppState) -> CliResult<()> {
    println!("🔍 Verifying ledger...");

    match state.ledger.state().verify_invariants() {
        Ok(()) => {
            println!("✅ Ledger is consistent!");
            println!("   Digest: {}", state.ledger.state().digest());
            Ok(())
        }
        Err(e) => {
            println!("❌ Ledger verification FAILED: {}", e);
            Err(e.into())
        }
    }
}

/// List available backups
pub fn cmd_backups(state: &AppState) -> CliResult<()> {
    let stats = state.storage.stats()?;
    let backups = state.storage.list_backups();

    println!("💾 Storage at {:?}", stats.data_dir);
    println!("   ├─ Ledger file: {} bytes", stats.file_size);
    println!("   └─ Backups: {}", stats.backup_count);
    for index in backups {
        println!("      └─ #{}", index);
    }

    Ok(())
}

/// Restore the ledger from a backup
pub fn cmd_restore(state: &mut AppState, index: usize) -> CliResult<()> {
    let restored = state.storage.restore_backup(index)?;
    state.ledger = Ledger::from_state(restored, state.ledger.clock())?;

    println!("♻️  Restored backup #{}", index);
    println!(
        "   Total supply: {}",
        format_amount(state.ledger.total_supply())
    );
    Ok(())
}

/// Export ledger to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(state.ledger.state(), path)?;
    println!("📦 Ledger exported to {:?}", path);
    Ok(())
}

/// Import ledger from file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    // Digest and invariants are checked on load
    let imported = crate::storage::load_from_file(path)?;

    state.ledger = Ledger::from_state(imported, state.ledger.clock())?;
    state.save()?;

    println!("📥 Ledger imported from {:?}", path);
    println!(
        "   Total supply: {}",
        format_amount(state.ledger.total_supply())
    );

    Ok(())
}
