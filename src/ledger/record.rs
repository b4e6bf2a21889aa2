//! Mint audit records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum metadata length, in characters
pub const MAX_METADATA_LEN: usize = 500;

/// Immutable audit entry written by every successful mint
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintRecord {
    /// Base units minted
    pub amount: u128,
    /// Account credited
    pub recipient: String,
    /// Free-form note supplied by the minter
    pub metadata: String,
    /// When the mint was applied
    pub created_at: DateTime<Utc>,
}

/// Length of metadata as the ledger counts it (Unicode scalar values)
pub fn metadata_len(metadata: &str) -> usize {
    metadata.chars().count()
}
