//! MediShareNet token ledger
//!
//! The authoritative state machine for the MSH token:
//! - Balances per account and a capped total supply
//! - Minter registry and an append-only mint log
//! - Admin-controlled pause and per-account transfer restrictions
//!
//! # Example
//!
//! ```
//! use medishare_ledger::ledger::{Ledger, LedgerError};
//!
//! let mut ledger = Ledger::new();
//! ledger.add_minter("contract-owner", "minter").unwrap();
//!
//! let id = ledger.mint("minter", 500_000, "alice", "Reward").unwrap();
//! assert_eq!(id, 1);
//! assert_eq!(ledger.balance_of("alice"), 500_000);
//!
//! // The owner account can never receive tokens
//! assert_eq!(
//!     ledger.transfer("alice", 10, "alice", "contract-owner"),
//!     Err(LedgerError::InvalidRecipient)
//! );
//! ```

pub mod amount;
pub mod clock;
pub mod error;
pub mod genesis;
pub mod record;
pub mod state;

pub use amount::{format_amount, parse_amount, AmountError, DECIMALS};
pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use error::{LedgerError, LedgerResult};
pub use genesis::{ConfigError, GenesisConfig, DEFAULT_INITIAL_SUPPLY, DEFAULT_OWNER};
pub use record::{MintRecord, MAX_METADATA_LEN};
pub use state::{InvariantError, Ledger, LedgerState, MAX_SUPPLY, TOKEN_NAME, TOKEN_SYMBOL};
