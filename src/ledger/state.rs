//! Ledger state machine
//!
//! Owns balances, supply, minters, restrictions and the mint log. Every
//! mutating operation runs all of its checks before touching state, so a
//! rejected call leaves the ledger exactly as it was.

use crate::crypto::sha256_hex;
use crate::ledger::clock::{Clock, SystemClock};
use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::genesis::{ConfigError, GenesisConfig};
use crate::ledger::record::{metadata_len, MintRecord, MAX_METADATA_LEN};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Token name
pub const TOKEN_NAME: &str = "MediShareNet Token";

/// Token symbol
pub const TOKEN_SYMBOL: &str = "MSH";

/// Hard cap on total supply, in base units
pub const MAX_SUPPLY: u128 = 1_000_000_000_000;

/// Raised when a state fails its consistency checks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("Balance sum {sum} does not match total supply {total_supply}")]
    SupplyMismatch { sum: u128, total_supply: u128 },
    #[error("Total supply {0} exceeds the supply cap")]
    SupplyCapExceeded(u128),
    #[error("Mint log holds {records} records but counter is {counter}")]
    CounterMismatch { records: usize, counter: u64 },
    #[error("Mint log is not contiguous: missing id {0}")]
    MissingRecord(u64),
}

/// Serializable ledger data
///
/// Ordered maps keep the encoding deterministic, which the state digest
/// relies on.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerState {
    /// Reserved owner / treasury account; never a valid recipient
    owner: String,
    admin: String,
    total_supply: u128,
    paused: bool,
    /// Last issued mint record id (0 = none yet)
    mint_counter: u64,
    balances: BTreeMap<String, u128>,
    minters: BTreeMap<String, bool>,
    mint_records: BTreeMap<u64, MintRecord>,
    transfer_restrictions: BTreeMap<String, bool>,
}

impl LedgerState {
    /// Genesis state: the owner holds the whole initial supply and is admin
    pub(crate) fn genesis(config: &GenesisConfig) -> Self {
        let mut balances = BTreeMap::new();
        if config.initial_supply > 0 {
            balances.insert(config.owner.clone(), config.initial_supply);
        }

        Self {
            owner: config.owner.clone(),
            admin: config.owner.clone(),
            total_supply: config.initial_supply,
            paused: false,
            mint_counter: 0,
            balances,
            minters: BTreeMap::new(),
            mint_records: BTreeMap::new(),
            transfer_restrictions: BTreeMap::new(),
        }
    }

    // =========================================================================
    // Read-only accessors
    // =========================================================================

    pub fn name(&self) -> &'static str {
        TOKEN_NAME
    }

    pub fn symbol(&self) -> &'static str {
        TOKEN_SYMBOL
    }

    pub fn decimals(&self) -> u8 {
        crate::ledger::amount::DECIMALS
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Balance of an account; unknown accounts hold 0
    pub fn balance_of(&self, account: &str) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Mint record by id; `None` for ids never issued
    pub fn mint_record(&self, id: u64) -> Option<&MintRecord> {
        self.mint_records.get(&id)
    }

    /// Whether an account may currently mint; unknown accounts may not
    pub fn is_minter(&self, account: &str) -> bool {
        self.minters.get(account).copied().unwrap_or(false)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether an account is blocked from sending; unknown accounts are not
    pub fn transfer_restriction(&self, account: &str) -> bool {
        self.transfer_restrictions
            .get(account)
            .copied()
            .unwrap_or(false)
    }

    pub fn admin(&self) -> &str {
        &self.admin
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Number of mint records issued so far
    pub fn mint_count(&self) -> u64 {
        self.mint_counter
    }

    /// All mint records in id order
    pub fn mint_records(&self) -> impl Iterator<Item = (u64, &MintRecord)> {
        self.mint_records.iter().map(|(id, record)| (*id, record))
    }

    /// Accounts with a positive balance
    pub fn holders(&self) -> Vec<(&str, u128)> {
        self.balances
            .iter()
            .filter(|(_, &b)| b > 0)
            .map(|(account, &b)| (account.as_str(), b))
            .collect()
    }

    /// Whether an account has ever been registered as a minter
    fn minter_registered(&self, account: &str) -> bool {
        self.minters.contains_key(account)
    }

    /// Check the supply, cap and mint log invariants
    pub fn verify_invariants(&self) -> Result<(), InvariantError> {
        let sum = self
            .balances
            .values()
            .try_fold(0u128, |acc, b| acc.checked_add(*b))
            .unwrap_or(u128::MAX);
        if sum != self.total_supply {
            return Err(InvariantError::SupplyMismatch {
                sum,
                total_supply: self.total_supply,
            });
        }

        if self.total_supply > MAX_SUPPLY {
            return Err(InvariantError::SupplyCapExceeded(self.total_supply));
        }

        if self.mint_records.len() as u64 != self.mint_counter {
            return Err(InvariantError::CounterMismatch {
                records: self.mint_records.len(),
                counter: self.mint_counter,
            });
        }
        if let Some(missing) = (1..=self.mint_counter).find(|id| !self.mint_records.contains_key(id)) {
            return Err(InvariantError::MissingRecord(missing));
        }

        Ok(())
    }

    /// SHA-256 over the canonical JSON encoding
    pub fn digest(&self) -> String {
        // Serializing plain maps of strings and integers cannot fail
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        sha256_hex(&bytes)
    }
}

/// The ledger: state plus the clock used to stamp mint records
#[derive(Clone, Debug)]
pub struct Ledger {
    state: LedgerState,
    clock: Arc<dyn Clock>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Default genesis with the system clock
    pub fn new() -> Self {
        // The default genesis always passes validation
        Self::build(&GenesisConfig::default(), Arc::new(SystemClock))
    }

    /// Fresh ledger from a genesis configuration
    ///
    /// Rejects an empty owner or an initial supply above the cap.
    pub fn with_genesis(config: &GenesisConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: &GenesisConfig, clock: Arc<dyn Clock>) -> Self {
        log::info!(
            "Ledger genesis: owner {} holds {} base units",
            config.owner,
            config.initial_supply
        );
        Self {
            state: LedgerState::genesis(config),
            clock,
        }
    }

    /// Resume from a previously saved state, which must pass its invariants
    pub fn from_state(state: LedgerState, clock: Arc<dyn Clock>) -> Result<Self, InvariantError> {
        state.verify_invariants()?;
        Ok(Self { state, clock })
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn into_state(self) -> LedgerState {
        self.state
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    // =========================================================================
    // Read-only accessors
    // =========================================================================

    pub fn name(&self) -> &'static str {
        self.state.name()
    }

    pub fn symbol(&self) -> &'static str {
        self.state.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.state.decimals()
    }

    pub fn total_supply(&self) -> u128 {
        self.state.total_supply()
    }

    pub fn balance_of(&self, account: &str) -> u128 {
        self.state.balance_of(account)
    }

    pub fn mint_record(&self, id: u64) -> Option<&MintRecord> {
        self.state.mint_record(id)
    }

    pub fn is_minter(&self, account: &str) -> bool {
        self.state.is_minter(account)
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn transfer_restriction(&self, account: &str) -> bool {
        self.state.transfer_restriction(account)
    }

    // =========================================================================
    // Administration
    // =========================================================================

    fn require_admin(&self, op: &str, caller: &str) -> LedgerResult<()> {
        if caller != self.state.admin {
            return rejected(op, caller, LedgerError::NotAuthorized);
        }
        Ok(())
    }

    /// Hand the admin role to another account
    pub fn set_admin(&mut self, caller: &str, new_admin: &str) -> LedgerResult<()> {
        self.require_admin("set_admin", caller)?;

        self.state.admin = new_admin.to_string();
        log::info!("Admin changed: {} -> {}", caller, new_admin);
        Ok(())
    }

    /// Block mint, transfer and burn. Pausing twice is not an error.
    pub fn pause(&mut self, caller: &str) -> LedgerResult<()> {
        self.require_admin("pause", caller)?;

        self.state.paused = true;
        log::info!("Ledger paused by {}", caller);
        Ok(())
    }

    pub fn unpause(&mut self, caller: &str) -> LedgerResult<()> {
        self.require_admin("unpause", caller)?;

        self.state.paused = false;
        log::info!("Ledger unpaused by {}", caller);
        Ok(())
    }

    /// Register a minter
    ///
    /// Only accounts that were never registered qualify; a removed minter
    /// stays registered (as inactive) and cannot be added again.
    pub fn add_minter(&mut self, caller: &str, minter: &str) -> LedgerResult<()> {
        self.require_admin("add_minter", caller)?;
        if self.state.minter_registered(minter) {
            return rejected("add_minter", caller, LedgerError::AlreadyRegistered);
        }

        self.state.minters.insert(minter.to_string(), true);
        log::info!("Minter added: {}", minter);
        Ok(())
    }

    /// Deactivate a minter. The registry entry is kept.
    pub fn remove_minter(&mut self, caller: &str, minter: &str) -> LedgerResult<()> {
        self.require_admin("remove_minter", caller)?;

        self.state.minters.insert(minter.to_string(), false);
        log::info!("Minter removed: {}", minter);
        Ok(())
    }

    /// Flag or clear an account's outgoing transfer restriction
    pub fn set_transfer_restriction(
        &mut self,
        caller: &str,
        account: &str,
        restricted: bool,
    ) -> LedgerResult<()> {
        self.require_admin("set_transfer_restriction", caller)?;

        self.state
            .transfer_restrictions
            .insert(account.to_string(), restricted);
        log::info!("Transfer restriction for {} set to {}", account, restricted);
        Ok(())
    }

    // =========================================================================
    // Supply and balances
    // =========================================================================

    /// Mint new tokens to `recipient`, returning the new mint record id
    ///
    /// # Arguments
    /// * `caller` - Must be an active minter
    /// * `amount` - Base units to create
    /// * `recipient` - Account credited; never the owner account
    /// * `metadata` - Audit note, at most 500 characters
    pub fn mint(
        &mut self,
        caller: &str,
        amount: u128,
        recipient: &str,
        metadata: &str,
    ) -> LedgerResult<u64> {
        if self.state.paused {
            return rejected("mint", caller, LedgerError::Paused);
        }
        if !self.state.is_minter(caller) {
            return rejected("mint", caller, LedgerError::InvalidMinter);
        }
        if amount == 0 {
            return rejected("mint", caller, LedgerError::InvalidAmount);
        }
        if recipient == self.state.owner {
            return rejected("mint", caller, LedgerError::InvalidRecipient);
        }
        if metadata_len(metadata) > MAX_METADATA_LEN {
            return rejected("mint", caller, LedgerError::MetadataTooLong);
        }
        let new_supply = match self.state.total_supply.checked_add(amount) {
            Some(supply) if supply <= MAX_SUPPLY => supply,
            _ => return rejected("mint", caller, LedgerError::SupplyCapExceeded),
        };

        // A single balance never exceeds total supply, so this cannot overflow
        *self
            .state
            .balances
            .entry(recipient.to_string())
            .or_insert(0) += amount;
        self.state.total_supply = new_supply;

        let id = self.state.mint_counter + 1;
        self.state.mint_records.insert(
            id,
            MintRecord {
                amount,
                recipient: recipient.to_string(),
                metadata: metadata.to_string(),
                created_at: self.clock.now(),
            },
        );
        self.state.mint_counter = id;

        log::info!(
            "Mint #{}: {} base units to {} by {} (supply now {})",
            id,
            amount,
            recipient,
            caller,
            new_supply
        );
        Ok(id)
    }

    /// Move tokens from `sender` to `recipient`
    ///
    /// The caller must be the sender; there are no delegated transfers.
    pub fn transfer(
        &mut self,
        caller: &str,
        amount: u128,
        sender: &str,
        recipient: &str,
    ) -> LedgerResult<()> {
        if self.state.paused {
            return rejected("transfer", caller, LedgerError::Paused);
        }
        if caller != sender {
            return rejected("transfer", caller, LedgerError::NotAuthorized);
        }
        if self.state.transfer_restriction(sender) {
            return rejected("transfer", caller, LedgerError::TransferRestricted);
        }
        if amount == 0 {
            return rejected("transfer", caller, LedgerError::InvalidAmount);
        }
        if recipient == self.state.owner {
            return rejected("transfer", caller, LedgerError::InvalidRecipient);
        }
        let sender_balance = self.state.balance_of(sender);
        if sender_balance < amount {
            return rejected("transfer", caller, LedgerError::NotEnoughBalance);
        }

        // Debit first so a self-transfer nets to zero
        self.state
            .balances
            .insert(sender.to_string(), sender_balance - amount);
        *self
            .state
            .balances
            .entry(recipient.to_string())
            .or_insert(0) += amount;

        log::info!(
            "Transfer: {} base units {} -> {}",
            amount,
            sender,
            recipient
        );
        Ok(())
    }

    /// Destroy tokens held by the caller
    pub fn burn(&mut self, caller: &str, amount: u128) -> LedgerResult<()> {
        if self.state.paused {
            return rejected("burn", caller, LedgerError::Paused);
        }
        if amount == 0 {
            return rejected("burn", caller, LedgerError::InvalidAmount);
        }
        let balance = self.state.balance_of(caller);
        if balance < amount {
            return rejected("burn", caller, LedgerError::NotEnoughBalance);
        }

        self.state
            .balances
            .insert(caller.to_string(), balance - amount);
        self.state.total_supply -= amount;

        log::info!(
            "Burn: {} base units by {} (supply now {})",
            amount,
            caller,
            self.state.total_supply
        );
        Ok(())
    }
}

fn rejected<T>(op: &str, caller: &str, err: LedgerError) -> LedgerResult<T> {
    log::debug!("{} by {} rejected: {}", op, caller, err.kind());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::clock::{FixedClock, ManualClock};
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const OWNER: &str = "contract-owner";
    const ADMIN: &str = "wallet_admin";
    const MINTER: &str = "wallet_minter";
    const USER1: &str = "wallet_user1";
    const USER2: &str = "wallet_user2";

    fn create_test_ledger() -> Ledger {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Ledger::with_genesis(&GenesisConfig::default(), Arc::new(FixedClock(at))).unwrap()
    }

    fn ledger_with_minter() -> Ledger {
        let mut ledger = create_test_ledger();
        ledger.add_minter(OWNER, MINTER).unwrap();
        ledger
    }

    #[test]
    fn test_genesis() {
        let ledger = create_test_ledger();

        assert_eq!(ledger.name(), "MediShareNet Token");
        assert_eq!(ledger.symbol(), "MSH");
        assert_eq!(ledger.decimals(), 6);
        assert_eq!(ledger.total_supply(), 1_000_000);
        assert_eq!(ledger.balance_of(OWNER), 1_000_000);
        assert_eq!(ledger.state().admin(), OWNER);
        assert_eq!(ledger.state().mint_count(), 0);
        assert!(!ledger.is_paused());
        assert!(ledger.state().verify_invariants().is_ok());
    }

    #[test]
    fn test_genesis_rejects_invalid_config() {
        let over_cap = GenesisConfig {
            owner: OWNER.to_string(),
            initial_supply: MAX_SUPPLY + 5,
        };
        assert!(matches!(
            Ledger::with_genesis(&over_cap, Arc::new(SystemClock)),
            Err(ConfigError::SupplyTooLarge(n)) if n == MAX_SUPPLY + 5
        ));

        let no_owner = GenesisConfig {
            owner: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            Ledger::with_genesis(&no_owner, Arc::new(SystemClock)),
            Err(ConfigError::EmptyOwner)
        ));

        let at_cap = GenesisConfig {
            owner: OWNER.to_string(),
            initial_supply: MAX_SUPPLY,
        };
        let ledger = Ledger::with_genesis(&at_cap, Arc::new(SystemClock)).unwrap();
        assert_eq!(ledger.total_supply(), MAX_SUPPLY);
    }

    #[test]
    fn test_from_state_checks_invariants() {
        let ledger = ledger_with_minter();
        let clock = ledger.clock();

        let resumed = Ledger::from_state(ledger.state().clone(), Arc::clone(&clock)).unwrap();
        assert_eq!(resumed.state(), ledger.state());

        let mut state = ledger.state().clone();
        state.total_supply = MAX_SUPPLY + 5;
        state.balances.insert(OWNER.to_string(), MAX_SUPPLY + 5);
        assert!(matches!(
            Ledger::from_state(state, clock),
            Err(InvariantError::SupplyCapExceeded(_))
        ));
    }

    #[test]
    fn test_unknown_keys_default() {
        let ledger = create_test_ledger();

        assert_eq!(ledger.balance_of("nobody"), 0);
        assert!(!ledger.is_minter("nobody"));
        assert!(!ledger.transfer_restriction("nobody"));
        assert!(ledger.mint_record(0).is_none());
        assert!(ledger.mint_record(1).is_none());
    }

    #[test]
    fn test_set_admin() {
        let mut ledger = create_test_ledger();

        ledger.set_admin(OWNER, ADMIN).unwrap();
        assert_eq!(ledger.state().admin(), ADMIN);

        // Old admin lost its privileges
        assert_eq!(ledger.pause(OWNER), Err(LedgerError::NotAuthorized));
        ledger.pause(ADMIN).unwrap();
        assert!(ledger.is_paused());
    }

    #[test]
    fn test_owner_stays_reserved_after_admin_handover() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 100, USER1, "Test mint").unwrap();
        ledger.set_admin(OWNER, ADMIN).unwrap();
        let before = ledger.state().clone();

        assert_eq!(
            ledger.mint(MINTER, 100, OWNER, "to old owner"),
            Err(LedgerError::InvalidRecipient)
        );
        assert_eq!(
            ledger.transfer(USER1, 50, USER1, OWNER),
            Err(LedgerError::InvalidRecipient)
        );
        assert_eq!(ledger.state(), &before);

        // The new admin is an ordinary recipient
        ledger.mint(MINTER, 100, ADMIN, "to new admin").unwrap();
        ledger.transfer(USER1, 50, USER1, ADMIN).unwrap();
        assert_eq!(ledger.balance_of(ADMIN), 150);
    }

    #[test]
    fn test_admin_only_operations_reject_non_admin() {
        let mut ledger = create_test_ledger();
        let before = ledger.state().clone();

        assert_eq!(ledger.set_admin(USER1, ADMIN), Err(LedgerError::NotAuthorized));
        assert_eq!(ledger.pause(USER1), Err(LedgerError::NotAuthorized));
        assert_eq!(ledger.unpause(USER1), Err(LedgerError::NotAuthorized));
        assert_eq!(ledger.add_minter(USER1, MINTER), Err(LedgerError::NotAuthorized));
        assert_eq!(ledger.remove_minter(USER1, MINTER), Err(LedgerError::NotAuthorized));
        assert_eq!(
            ledger.set_transfer_restriction(USER1, USER2, true),
            Err(LedgerError::NotAuthorized)
        );

        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut ledger = create_test_ledger();

        ledger.pause(OWNER).unwrap();
        assert!(ledger.is_paused());
        ledger.pause(OWNER).unwrap();
        assert!(ledger.is_paused());

        ledger.unpause(OWNER).unwrap();
        ledger.unpause(OWNER).unwrap();
        assert!(!ledger.is_paused());
    }

    #[test]
    fn test_add_and_remove_minter() {
        let mut ledger = create_test_ledger();

        ledger.add_minter(OWNER, MINTER).unwrap();
        assert!(ledger.is_minter(MINTER));

        assert_eq!(
            ledger.add_minter(OWNER, MINTER),
            Err(LedgerError::AlreadyRegistered)
        );

        ledger.remove_minter(OWNER, MINTER).unwrap();
        assert!(!ledger.is_minter(MINTER));

        // Removed minters stay registered
        assert_eq!(
            ledger.add_minter(OWNER, MINTER),
            Err(LedgerError::AlreadyRegistered)
        );
        assert!(!ledger.is_minter(MINTER));
    }

    #[test]
    fn test_remove_unknown_minter_blocks_later_registration() {
        let mut ledger = create_test_ledger();

        ledger.remove_minter(OWNER, USER1).unwrap();
        assert_eq!(
            ledger.add_minter(OWNER, USER1),
            Err(LedgerError::AlreadyRegistered)
        );
    }

    #[test]
    fn test_mint_with_metadata() {
        let mut ledger = ledger_with_minter();

        let id = ledger
            .mint(MINTER, 500_000, USER1, "Reward for data submission")
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(ledger.balance_of(USER1), 500_000);
        assert_eq!(ledger.total_supply(), 1_500_000);

        let record = ledger.mint_record(1).unwrap();
        assert_eq!(record.amount, 500_000);
        assert_eq!(record.recipient, USER1);
        assert_eq!(record.metadata, "Reward for data submission");
        assert_eq!(
            record.created_at,
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_mint_check_order() {
        let mut ledger = ledger_with_minter();
        ledger.pause(OWNER).unwrap();

        // Paused wins over every other problem
        assert_eq!(
            ledger.mint(USER2, 0, OWNER, &"x".repeat(501)),
            Err(LedgerError::Paused)
        );
        ledger.unpause(OWNER).unwrap();

        assert_eq!(
            ledger.mint(USER2, 0, OWNER, "bad"),
            Err(LedgerError::InvalidMinter)
        );
        assert_eq!(
            ledger.mint(MINTER, 0, OWNER, "bad"),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            ledger.mint(MINTER, 10, OWNER, &"x".repeat(501)),
            Err(LedgerError::InvalidRecipient)
        );
        assert_eq!(
            ledger.mint(MINTER, MAX_SUPPLY, USER1, &"x".repeat(501)),
            Err(LedgerError::MetadataTooLong)
        );
        assert_eq!(
            ledger.mint(MINTER, MAX_SUPPLY, USER1, "ok"),
            Err(LedgerError::SupplyCapExceeded)
        );
    }

    #[test]
    fn test_mint_metadata_limit() {
        let mut ledger = ledger_with_minter();

        assert_eq!(ledger.mint(MINTER, 1, USER1, &"x".repeat(500)), Ok(1));
        assert_eq!(
            ledger.mint(MINTER, 1, USER1, &"x".repeat(501)),
            Err(LedgerError::MetadataTooLong)
        );
    }

    #[test]
    fn test_removed_minter_cannot_mint() {
        let mut ledger = ledger_with_minter();
        ledger.remove_minter(OWNER, MINTER).unwrap();

        assert_eq!(
            ledger.mint(MINTER, 1000, USER1, "late"),
            Err(LedgerError::InvalidMinter)
        );
    }

    #[test]
    fn test_supply_cap() {
        let mut ledger = ledger_with_minter();
        let before = ledger.state().clone();

        // Exceeds after the initial 1M
        assert_eq!(
            ledger.mint(MINTER, 1_000_000_000_000, USER1, "Too much"),
            Err(LedgerError::SupplyCapExceeded)
        );
        assert_eq!(
            ledger.mint(MINTER, u128::MAX, USER1, "overflow"),
            Err(LedgerError::SupplyCapExceeded)
        );
        assert_eq!(ledger.state(), &before);

        // Filling the cap exactly is allowed
        let room = MAX_SUPPLY - ledger.total_supply();
        ledger.mint(MINTER, room, USER1, "fill").unwrap();
        assert_eq!(ledger.total_supply(), MAX_SUPPLY);
        assert_eq!(
            ledger.mint(MINTER, 1, USER1, "one more"),
            Err(LedgerError::SupplyCapExceeded)
        );
    }

    #[test]
    fn test_mint_ids_skip_failures() {
        let mut ledger = ledger_with_minter();

        assert_eq!(ledger.mint(MINTER, 10, USER1, "a"), Ok(1));
        assert!(ledger.mint(MINTER, 0, USER1, "fail").is_err());
        assert!(ledger.mint(USER1, 10, USER1, "fail").is_err());
        assert_eq!(ledger.mint(MINTER, 20, USER2, "b"), Ok(2));
        assert!(ledger.mint(MINTER, 10, OWNER, "fail").is_err());
        assert_eq!(ledger.mint(MINTER, 30, USER1, "c"), Ok(3));

        let ids: Vec<u64> = ledger.state().mint_records().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(ledger.state().mint_count(), 3);
    }

    #[test]
    fn test_transfer() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 100_000, USER1, "Test mint").unwrap();

        ledger.transfer(USER1, 50_000, USER1, USER2).unwrap();
        assert_eq!(ledger.balance_of(USER1), 50_000);
        assert_eq!(ledger.balance_of(USER2), 50_000);
        assert_eq!(ledger.total_supply(), 1_100_000);
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 100, USER1, "Test mint").unwrap();

        ledger.transfer(USER1, 60, USER1, USER1).unwrap();
        assert_eq!(ledger.balance_of(USER1), 100);
    }

    #[test]
    fn test_transfer_check_order() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 100, USER1, "Test mint").unwrap();
        ledger.set_transfer_restriction(OWNER, USER1, true).unwrap();
        ledger.pause(OWNER).unwrap();

        assert_eq!(
            ledger.transfer(USER2, 0, USER1, OWNER),
            Err(LedgerError::Paused)
        );
        ledger.unpause(OWNER).unwrap();

        assert_eq!(
            ledger.transfer(USER2, 0, USER1, OWNER),
            Err(LedgerError::NotAuthorized)
        );
        assert_eq!(
            ledger.transfer(USER1, 0, USER1, OWNER),
            Err(LedgerError::TransferRestricted)
        );
        ledger.set_transfer_restriction(OWNER, USER1, false).unwrap();

        assert_eq!(
            ledger.transfer(USER1, 0, USER1, OWNER),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            ledger.transfer(USER1, 1000, USER1, OWNER),
            Err(LedgerError::InvalidRecipient)
        );
        assert_eq!(
            ledger.transfer(USER1, 1000, USER1, USER2),
            Err(LedgerError::NotEnoughBalance)
        );
    }

    #[test]
    fn test_owner_is_never_a_recipient() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 100, USER1, "Test mint").unwrap();
        let before = ledger.state().clone();

        assert_eq!(
            ledger.mint(MINTER, 100, OWNER, "to owner"),
            Err(LedgerError::InvalidRecipient)
        );
        assert_eq!(
            ledger.transfer(USER1, 50, USER1, OWNER),
            Err(LedgerError::InvalidRecipient)
        );
        assert_eq!(ledger.state(), &before);

        // The owner itself may still send
        ledger.transfer(OWNER, 10, OWNER, USER2).unwrap();
        assert_eq!(ledger.balance_of(USER2), 10);
    }

    #[test]
    fn test_restriction_blocks_only_transfer() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 100_000, USER1, "Test mint").unwrap();
        ledger.set_transfer_restriction(OWNER, USER1, true).unwrap();
        assert!(ledger.transfer_restriction(USER1));

        assert_eq!(
            ledger.transfer(USER1, 50_000, USER1, USER2),
            Err(LedgerError::TransferRestricted)
        );
        assert_eq!(ledger.balance_of(USER1), 100_000);
        assert_eq!(ledger.balance_of(USER2), 0);

        // Restricted accounts still receive and burn
        ledger.mint(MINTER, 1, USER1, "still ok").unwrap();
        ledger.burn(USER1, 1).unwrap();
        ledger.transfer(OWNER, 5, OWNER, USER1).unwrap();
        assert_eq!(ledger.balance_of(USER1), 100_005);
    }

    #[test]
    fn test_burn() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 100_000, USER1, "Test mint").unwrap();

        ledger.burn(USER1, 30_000).unwrap();
        assert_eq!(ledger.balance_of(USER1), 70_000);
        assert_eq!(ledger.total_supply(), 1_070_000);
    }

    #[test]
    fn test_burn_more_than_balance() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 100_000, USER1, "Test mint").unwrap();
        let before = ledger.state().clone();

        assert_eq!(
            ledger.burn(USER1, 200_000),
            Err(LedgerError::NotEnoughBalance)
        );
        assert_eq!(ledger.burn(USER1, 0), Err(LedgerError::InvalidAmount));
        assert_eq!(ledger.burn(USER2, 1), Err(LedgerError::NotEnoughBalance));
        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn test_pause_blocks_value_movement_only() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 1000, USER1, "Test mint").unwrap();
        ledger.pause(OWNER).unwrap();

        assert_eq!(ledger.mint(MINTER, 1, USER1, "p"), Err(LedgerError::Paused));
        assert_eq!(
            ledger.transfer(USER1, 1, USER1, USER2),
            Err(LedgerError::Paused)
        );
        assert_eq!(ledger.burn(USER1, 1), Err(LedgerError::Paused));

        // Management keeps working
        ledger.add_minter(OWNER, USER2).unwrap();
        ledger.remove_minter(OWNER, MINTER).unwrap();
        ledger.set_transfer_restriction(OWNER, USER1, true).unwrap();
        ledger.set_admin(OWNER, ADMIN).unwrap();
        ledger.unpause(ADMIN).unwrap();
        assert!(!ledger.is_paused());
    }

    #[test]
    fn test_scenarios_b_through_d() {
        let mut ledger = ledger_with_minter();

        // B
        assert_eq!(ledger.mint(MINTER, 500_000, USER1, "Reward"), Ok(1));
        assert_eq!(ledger.balance_of(USER1), 500_000);
        assert_eq!(ledger.total_supply(), 1_500_000);
        assert_eq!(ledger.mint_record(1).unwrap().amount, 500_000);

        // D
        ledger.burn(USER1, 30_000).unwrap();
        assert_eq!(ledger.balance_of(USER1), 470_000);
        assert_eq!(ledger.total_supply(), 1_470_000);
        let before = ledger.state().clone();
        assert_eq!(
            ledger.burn(USER1, 470_001),
            Err(LedgerError::NotEnoughBalance)
        );
        assert_eq!(ledger.state(), &before);

        // C
        ledger.set_transfer_restriction(OWNER, USER1, true).unwrap();
        assert_eq!(
            ledger.transfer(USER1, 50_000, USER1, USER2),
            Err(LedgerError::TransferRestricted)
        );
        assert_eq!(ledger.balance_of(USER1), 470_000);
        assert_eq!(ledger.balance_of(USER2), 0);
    }

    #[test]
    fn test_holders() {
        let mut ledger = ledger_with_minter();
        ledger.mint(MINTER, 10, USER1, "a").unwrap();
        ledger.burn(USER1, 10).unwrap();
        ledger.mint(MINTER, 5, USER2, "b").unwrap();

        let holders = ledger.state().holders();
        assert_eq!(holders, vec![(OWNER, 1_000_000), (USER2, 5)]);
    }

    #[test]
    fn test_digest_tracks_state() {
        let mut ledger = ledger_with_minter();
        let first = ledger.state().digest();
        assert_eq!(first, ledger.state().clone().digest());
        assert_eq!(first.len(), 64);

        ledger.mint(MINTER, 1, USER1, "x").unwrap();
        assert_ne!(first, ledger.state().digest());
    }

    #[test]
    fn test_mint_records_follow_the_clock() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let mut ledger = Ledger::with_genesis(&GenesisConfig::default(), clock.clone()).unwrap();
        ledger.add_minter(OWNER, MINTER).unwrap();

        let first = ledger.mint(MINTER, 10, USER1, "first").unwrap();
        clock.advance(Duration::minutes(5));
        let second = ledger.mint(MINTER, 20, USER2, "second").unwrap();

        assert_eq!(ledger.mint_record(first).unwrap().created_at, start);
        assert_eq!(
            ledger.mint_record(second).unwrap().created_at,
            start + Duration::minutes(5)
        );
    }

    #[test]
    fn test_verify_invariants_detects_tampering() {
        let ledger = ledger_with_minter();

        let mut state = ledger.state().clone();
        state.total_supply += 1;
        assert!(matches!(
            state.verify_invariants(),
            Err(InvariantError::SupplyMismatch { .. })
        ));

        let mut state = ledger.state().clone();
        state.mint_counter = 2;
        assert!(matches!(
            state.verify_invariants(),
            Err(InvariantError::CounterMismatch { .. })
        ));
    }

    #[test]
    fn test_random_sequences_preserve_invariants() {
        let accounts = [OWNER, ADMIN, MINTER, USER1, USER2];
        let mut rng = StdRng::seed_from_u64(7);
        let mut ledger = ledger_with_minter();
        let mut successful_mints = 0u64;

        for _ in 0..2_000 {
            let caller = accounts[rng.gen_range(0..accounts.len())];
            let other = accounts[rng.gen_range(0..accounts.len())];
            let amount: u128 = match rng.gen_range(0..10) {
                0 => 0,
                1 => MAX_SUPPLY,
                _ => rng.gen_range(1..200_000),
            };
            let before = ledger.state().clone();

            let result = match rng.gen_range(0..9) {
                0 => ledger.mint(caller, amount, other, "fuzz").map(|id| {
                    successful_mints += 1;
                    assert_eq!(id, successful_mints);
                }),
                1 | 2 => ledger.transfer(caller, amount, caller, other),
                3 => ledger.burn(caller, amount),
                4 => ledger.set_transfer_restriction(caller, other, rng.gen_bool(0.3)),
                5 => ledger.add_minter(caller, other),
                6 => ledger.remove_minter(caller, other),
                7 => {
                    if rng.gen_bool(0.5) {
                        ledger.pause(caller)
                    } else {
                        ledger.unpause(caller)
                    }
                }
                _ => ledger.set_admin(caller, other),
            };

            if result.is_err() {
                assert_eq!(ledger.state(), &before);
            }
            assert!(ledger.state().verify_invariants().is_ok());
            assert!(ledger.total_supply() <= MAX_SUPPLY);
        }
    }
}
