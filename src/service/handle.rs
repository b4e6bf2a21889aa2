//! Shared ledger handle
//!
//! Mutations take the write lock for their whole duration, so operations are
//! applied strictly one at a time. Readers share the read lock and always see
//! a fully applied state.

use crate::ledger::{Ledger, LedgerError, LedgerState, MintRecord};
use crate::storage::{Storage, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors surfaced by the shared handle
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Ledger rejected the operation: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Persistence task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// The ledger error, if the ledger itself rejected the call
    pub fn ledger_error(&self) -> Option<LedgerError> {
        match self {
            ServiceError::Ledger(e) => Some(*e),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Cloneable, thread-safe handle to a single ledger
#[derive(Clone)]
pub struct LedgerService {
    ledger: Arc<RwLock<Ledger>>,
    storage: Option<Arc<Storage>>,
}

impl LedgerService {
    /// In-memory only
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            storage: None,
        }
    }

    /// Persist every committed mutation
    ///
    /// A mutation is applied to a copy first and only becomes visible once
    /// the copy is on disk.
    pub fn with_storage(ledger: Ledger, storage: Arc<Storage>) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            storage: Some(storage),
        }
    }

    async fn apply<T, F>(&self, op: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Ledger) -> Result<T, LedgerError>,
    {
        let mut ledger = self.ledger.write().await;

        let storage = match &self.storage {
            None => return Ok(op(&mut *ledger)?),
            Some(storage) => Arc::clone(storage),
        };

        let mut next = ledger.clone();
        let value = op(&mut next)?;

        let state = next.state().clone();
        tokio::task::spawn_blocking(move || storage.save(&state)).await??;

        *ledger = next;
        Ok(value)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn set_admin(&self, caller: &str, new_admin: &str) -> ServiceResult<()> {
        self.apply(|l| l.set_admin(caller, new_admin)).await
    }

    pub async fn pause(&self, caller: &str) -> ServiceResult<()> {
        self.apply(|l| l.pause(caller)).await
    }

    pub async fn unpause(&self, caller: &str) -> ServiceResult<()> {
        self.apply(|l| l.unpause(caller)).await
    }

    pub async fn add_minter(&self, caller: &str, minter: &str) -> ServiceResult<()> {
        self.apply(|l| l.add_minter(caller, minter)).await
    }

    pub async fn remove_minter(&self, caller: &str, minter: &str) -> ServiceResult<()> {
        self.apply(|l| l.remove_minter(caller, minter)).await
    }

    pub async fn mint(
        &self,
        caller: &str,
        amount: u128,
        recipient: &str,
        metadata: &str,
    ) -> ServiceResult<u64> {
        self.apply(|l| l.mint(caller, amount, recipient, metadata))
            .await
    }

    pub async fn transfer(
        &self,
        caller: &str,
        amount: u128,
        sender: &str,
        recipient: &str,
    ) -> ServiceResult<()> {
        self.apply(|l| l.transfer(caller, amount, sender, recipient))
            .await
    }

    pub async fn burn(&self, caller: &str, amount: u128) -> ServiceResult<()> {
        self.apply(|l| l.burn(caller, amount)).await
    }

    pub async fn set_transfer_restriction(
        &self,
        caller: &str,
        account: &str,
        restricted: bool,
    ) -> ServiceResult<()> {
        self.apply(|l| l.set_transfer_restriction(caller, account, restricted))
            .await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn name(&self) -> &'static str {
        self.ledger.read().await.name()
    }

    pub async fn symbol(&self) -> &'static str {
        self.ledger.read().await.symbol()
    }

    pub async fn decimals(&self) -> u8 {
        self.ledger.read().await.decimals()
    }

    pub async fn total_supply(&self) -> u128 {
        self.ledger.read().await.total_supply()
    }

    pub async fn balance_of(&self, account: &str) -> u128 {
        self.ledger.read().await.balance_of(account)
    }

    pub async fn mint_record(&self, id: u64) -> Option<MintRecord> {
        self.ledger.read().await.mint_record(id).cloned()
    }

    pub async fn is_minter(&self, account: &str) -> bool {
        self.ledger.read().await.is_minter(account)
    }

    pub async fn is_paused(&self) -> bool {
        self.ledger.read().await.is_paused()
    }

    pub async fn transfer_restriction(&self, account: &str) -> bool {
        self.ledger.read().await.transfer_restriction(account)
    }

    /// Consistent copy of the whole state
    pub async fn snapshot(&self) -> LedgerState {
        self.ledger.read().await.state().clone()
    }
}
