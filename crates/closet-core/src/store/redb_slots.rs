// ============================================================================
// RedbSlots — Embedded slot storage (redb)
// ============================================================================
// One table of string slots, each holding a JSON document.
// Default path: ~/.closet/closet.redb (override via CLOSET_DB_PATH env var)
// ============================================================================

use anyhow::{anyhow, Result};
use redb::{Database, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::SlotStorage;
use crate::error::StorageError;

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "CLOSET_DB_PATH";

const SLOTS: TableDefinition<&str, &str> = TableDefinition::new("slots");

/// redb-backed slot storage
pub struct RedbSlots {
    db: Database,
    path: PathBuf,
}

impl RedbSlots {
    /// Open (or create) the database at the given path.
    /// If `path` is None, uses CLOSET_DB_PATH env var or ~/.closet/closet.redb
    pub fn open(path: Option<&str>) -> Result<Self> {
        let db_path = if let Some(p) = path {
            PathBuf::from(p)
        } else if let Ok(env_path) = std::env::var(DB_PATH_ENV) {
            PathBuf::from(env_path)
        } else {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
            let closet_dir = home.join(".closet");
            std::fs::create_dir_all(&closet_dir)
                .map_err(|e| anyhow!("Failed to create .closet directory: {}", e))?;
            closet_dir.join("closet.redb")
        };

        info!("Opening database at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| anyhow!("Failed to open database: {}", e))?;

        // Ensure the slots table exists so readers never see a missing table
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn
                .open_table(SLOTS)
                .map_err(|e| anyhow!("Failed to create slots table: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit init: {}", e))?;

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(SLOTS)
            .map_err(|e| anyhow!("Failed to open slots table: {}", e))?;

        let value = table
            .get(key)
            .map_err(|e| anyhow!("Failed to get slot {}: {}", key, e))?
            .map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(SLOTS)
                .map_err(|e| anyhow!("Failed to open slots table: {}", e))?;
            table.insert(key, value)
                .map_err(|e| anyhow!("Failed to insert slot {}: {}", key, e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;

        debug!("Stored slot {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        let removed;
        {
            let mut table = write_txn.open_table(SLOTS)
                .map_err(|e| anyhow!("Failed to open slots table: {}", e))?;
            removed = table.remove(key)
                .map_err(|e| anyhow!("Failed to remove slot {}: {}", key, e))?
                .is_some();
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit delete: {}", e))?;

        if removed {
            debug!("Deleted slot: {}", key);
        }
        Ok(removed)
    }
}

impl SlotStorage for RedbSlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.get(key).map_err(StorageError::backend)
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.put(key, value).map_err(StorageError::backend)
    }

    fn remove_slot(&self, key: &str) -> Result<bool, StorageError> {
        self.delete(key).map_err(StorageError::backend)
    }
}
