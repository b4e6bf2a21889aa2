//! Shared access to a single ledger
//!
//! Wraps the state machine behind an async read/write lock and optionally
//! persists every committed mutation.

pub mod handle;
pub mod response;

pub use handle::{LedgerService, ServiceError, ServiceResult};
pub use response::Response;
