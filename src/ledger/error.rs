//! Ledger error taxonomy
//!
//! Every rejected operation maps to exactly one of these kinds. The numeric
//! codes are part of the external contract and must not be renumbered.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Ledger-related errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerError {
    #[error("Not authorized: caller lacks the required privilege")]
    NotAuthorized,
    #[error("Contract is paused")]
    Paused,
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Invalid recipient: the owner account cannot receive tokens")]
    InvalidRecipient,
    #[error("Invalid minter: caller is not an active minter")]
    InvalidMinter,
    #[error("Minter already registered")]
    AlreadyRegistered,
    #[error("Metadata too long: at most 500 characters")]
    MetadataTooLong,
    #[error("Transfer restricted: sender is flagged")]
    TransferRestricted,
    #[error("Supply cap exceeded")]
    SupplyCapExceeded,
    #[error("Not enough balance")]
    NotEnoughBalance,
}

impl LedgerError {
    /// All error kinds, in code order
    pub const ALL: [LedgerError; 10] = [
        LedgerError::NotAuthorized,
        LedgerError::Paused,
        LedgerError::InvalidAmount,
        LedgerError::InvalidRecipient,
        LedgerError::InvalidMinter,
        LedgerError::AlreadyRegistered,
        LedgerError::MetadataTooLong,
        LedgerError::TransferRestricted,
        LedgerError::SupplyCapExceeded,
        LedgerError::NotEnoughBalance,
    ];

    /// Numeric error code
    pub fn code(&self) -> u32 {
        match self {
            LedgerError::NotAuthorized => 100,
            LedgerError::Paused => 101,
            LedgerError::InvalidAmount => 102,
            LedgerError::InvalidRecipient => 103,
            LedgerError::InvalidMinter => 104,
            LedgerError::AlreadyRegistered => 105,
            LedgerError::MetadataTooLong => 106,
            LedgerError::TransferRestricted => 107,
            LedgerError::SupplyCapExceeded => 108,
            LedgerError::NotEnoughBalance => 109,
        }
    }

    /// Look up an error kind by its numeric code
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }

    /// Stable upper-case kind name (e.g. `NOT_AUTHORIZED`)
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::NotAuthorized => "NOT_AUTHORIZED",
            LedgerError::Paused => "PAUSED",
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::InvalidRecipient => "INVALID_RECIPIENT",
            LedgerError::InvalidMinter => "INVALID_MINTER",
            LedgerError::AlreadyRegistered => "ALREADY_REGISTERED",
            LedgerError::MetadataTooLong => "METADATA_TOO_LONG",
            LedgerError::TransferRestricted => "TRANSFER_RESTRICTED",
            LedgerError::SupplyCapExceeded => "SUPPLY_CAP_EXCEEDED",
            LedgerError::NotEnoughBalance => "NOT_ENOUGH_BALANCE",
        }
    }
}

// Errors travel as their numeric code.
impl Serialize for LedgerError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

impl<'de> Deserialize<'de> for LedgerError {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u32::deserialize(deserializer)?;
        LedgerError::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown ledger error code {}", code)))
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
