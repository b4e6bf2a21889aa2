//! Genesis configuration
//!
//! Describes who owns the initial supply. Loaded from JSON or taken from
//! defaults.

use crate::ledger::state::MAX_SUPPLY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default owner / treasury account
pub const DEFAULT_OWNER: &str = "contract-owner";

/// Default initial supply in base units
pub const DEFAULT_INITIAL_SUPPLY: u128 = 1_000_000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Owner account must not be empty")]
    EmptyOwner,
    #[error("Initial supply {0} exceeds the supply cap")]
    SupplyTooLarge(u128),
}

/// Genesis parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Reserved owner account; also the first admin
    pub owner: String,
    /// Balance credited to the owner at genesis
    pub initial_supply: u128,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            initial_supply: DEFAULT_INITIAL_SUPPLY,
        }
    }
}

impl GenesisConfig {
    /// Load and validate a genesis file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: GenesisConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.trim().is_empty() {
            return Err(ConfigError::EmptyOwner);
        }
        if self.initial_supply > MAX_SUPPLY {
            return Err(ConfigError::SupplyTooLarge(self.initial_supply));
        }
        Ok(())
    }
}
