//! Ledger persistence layer
//!
//! Saves ledger snapshots as JSON with a SHA-256 digest, rotating backups
//! on every write. Loading refuses snapshots whose digest or invariants do
//! not check out.

use crate::crypto::digest_matches;
use crate::ledger::{InvariantError, LedgerState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Snapshot format understood by this build
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Snapshot digest mismatch")]
    DigestMismatch,
    #[error("Unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),
    #[error("Snapshot violates ledger invariants: {0}")]
    Invariant(#[from] InvariantError),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub ledger_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ledger_data"),
            ledger_file: "ledger.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// On-disk snapshot envelope
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    format_version: u32,
    digest: String,
    state: LedgerState,
}

impl Snapshot {
    fn seal(state: &LedgerState) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            digest: state.digest(),
            state: state.clone(),
        }
    }

    /// Check version, digest and invariants, yielding the state
    fn open(self) -> Result<LedgerState, StorageError> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion(self.format_version));
        }

        let bytes = serde_json::to_vec(&self.state)?;
        if !digest_matches(&bytes, &self.digest) {
            log::warn!("Ledger snapshot digest mismatch");
            return Err(StorageError::DigestMismatch);
        }

        self.state.verify_invariants().map_err(|e| {
            log::warn!("Ledger snapshot failed invariant check: {}", e);
            e
        })?;

        Ok(self.state)
    }
}

/// Ledger storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StorageConfig::default())
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn ledger_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.ledger_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.ledger_file, index))
    }

    /// Save the ledger state to disk
    pub fn save(&self, state: &LedgerState) -> Result<(), StorageError> {
        let path = self.ledger_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("ledger.tmp");
        {
            let file = fs::File::create(&temp_path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &Snapshot::seal(state))?;
        }

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!("Ledger saved to {:?}", path);
        Ok(())
    }

    /// Load the ledger state from disk
    pub fn load(&self) -> Result<LedgerState, StorageError> {
        let path = self.ledger_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Ledger file not found".to_string(),
            ));
        }

        read_snapshot(&path)
    }

    /// Check if a saved ledger exists
    pub fn exists(&self) -> bool {
        self.ledger_path().exists()
    }

    /// Delete the saved ledger
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.ledger_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup (0 = most recent)
    ///
    /// The restored state becomes the current ledger file.
    pub fn restore_backup(&self, backup_index: usize) -> Result<LedgerState, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        let state = read_snapshot(&backup_path)?;
        self.save(&state)?;

        log::info!("Ledger restored from backup {}", backup_index);
        Ok(state)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.ledger_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

fn read_snapshot(path: &Path) -> Result<LedgerState, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    snapshot.open()
}

/// Export a ledger snapshot to a specific file path
pub fn save_to_file(state: &LedgerState, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &Snapshot::seal(state))?;
    Ok(())
}

/// Import a ledger snapshot from a specific file path
pub fn load_from_file(path: &Path) -> Result<LedgerState, StorageError> {
    read_snapshot(path)
}
