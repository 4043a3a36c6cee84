//! # redb-backed Sale Storage
//!
//! A disk-backed store for sale snapshots using the redb embedded database,
//! providing ACID transactions and crash safety (copy-on-write B-trees)
//! with zero configuration.
//!
//! The engine state is small, so the whole snapshot is written as one
//! versioned blob (see [`crate::snapshot`]) under a fixed key; every save
//! is a single atomic commit.

use crate::config::SaleConfig;
use crate::engine::SaleSnapshot;
use crate::snapshot::{snapshot_from_bytes, snapshot_to_bytes};
use crate::types::SaleError;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;

/// Table for sale state: fixed key -> snapshot blob.
const SALE_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("sale_state");

/// Key under which the current snapshot is stored.
const SNAPSHOT_KEY: &str = "snapshot";

/// Key under which the immutable sale configuration is stored.
const CONFIG_KEY: &str = "config";

/// A disk-backed sale state store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a sale database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SaleError> {
        let db = Database::create(path.as_ref()).map_err(|e| SaleError::Storage(e.to_string()))?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| SaleError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(SALE_STATE)
                .map_err(|e| SaleError::Storage(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| SaleError::Storage(e.to_string()))?;
        }

        Ok(Self { db })
    }

    /// Persist a snapshot in a single ACID transaction.
    pub fn save(&self, snapshot: &SaleSnapshot) -> Result<(), SaleError> {
        let bytes = snapshot_to_bytes(snapshot)?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| SaleError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SALE_STATE)
                .map_err(|e| SaleError::Storage(e.to_string()))?;
            table
                .insert(SNAPSHOT_KEY, bytes.as_slice())
                .map_err(|e| SaleError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| SaleError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Load the stored snapshot, if any.
    pub fn load(&self) -> Result<Option<SaleSnapshot>, SaleError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| SaleError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(SALE_STATE)
            .map_err(|e| SaleError::Storage(e.to_string()))?;

        let Some(blob) = table
            .get(SNAPSHOT_KEY)
            .map_err(|e| SaleError::Storage(e.to_string()))?
        else {
            return Ok(None);
        };

        let snapshot = snapshot_from_bytes(blob.value())?;
        Ok(Some(snapshot))
    }

    /// Persist the sale configuration alongside the snapshot.
    ///
    /// The configuration is immutable, so this is normally written exactly
    /// once, when the sale is initialized.
    pub fn save_config(&self, config: &SaleConfig) -> Result<(), SaleError> {
        let bytes =
            postcard::to_stdvec(config).map_err(|e| SaleError::Serialization(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| SaleError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SALE_STATE)
                .map_err(|e| SaleError::Storage(e.to_string()))?;
            table
                .insert(CONFIG_KEY, bytes.as_slice())
                .map_err(|e| SaleError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| SaleError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Load the stored sale configuration, if any.
    pub fn load_config(&self) -> Result<Option<SaleConfig>, SaleError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| SaleError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(SALE_STATE)
            .map_err(|e| SaleError::Storage(e.to_string()))?;

        let Some(blob) = table
            .get(CONFIG_KEY)
            .map_err(|e| SaleError::Storage(e.to_string()))?
        else {
            return Ok(None);
        };

        let config = postcard::from_bytes(blob.value())
            .map_err(|e| SaleError::Serialization(e.to_string()))?;
        Ok(Some(config))
    }
}

// =============================================================================
// TESTS
// =============================================================================
