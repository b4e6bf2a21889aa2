//! MediShareNet ledger: the authoritative state machine for the MSH token
//!
//! This crate provides:
//! - A single-writer ledger state machine (mint, transfer, burn, admin,
//!   minter registry, pause, transfer restrictions)
//! - An append-only mint audit log with injected timestamps
//! - Numeric error codes and a `{ success, value | error }` result envelope
//! - A lock-guarded shared handle for concurrent callers
//! - JSON snapshot persistence with SHA-256 integrity checks and backups
//!
//! # Example
//!
//! ```rust
//! use medishare_ledger::ledger::{Ledger, LedgerError};
//!
//! let mut ledger = Ledger::new();
//! assert_eq!(ledger.total_supply(), 1_000_000);
//! assert_eq!(ledger.decimals(), 6);
//!
//! ledger.add_minter("contract-owner", "minter").unwrap();
//! ledger.mint("minter", 500_000, "alice", "Reward").unwrap();
//!
//! ledger.set_transfer_restriction("contract-owner", "alice", true).unwrap();
//! assert_eq!(
//!     ledger.transfer("alice", 50_000, "alice", "bob"),
//!     Err(LedgerError::TransferRestricted)
//! );
//! ```

pub mod cli;
pub mod crypto;
pub mod ledger;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use ledger::{
    format_amount, parse_amount, Clock, GenesisConfig, Ledger, LedgerError, LedgerResult,
    LedgerState, MintRecord, SystemClock, MAX_METADATA_LEN, MAX_SUPPLY,
};
pub use service::{LedgerService, Response, ServiceError};
pub use storage::{Storage, StorageConfig, StorageError};
