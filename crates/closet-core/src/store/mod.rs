//! ============================================================================
//! Store Adapter - JSON documents in named slots
//! ============================================================================
//! The app keeps its whole state in one slot and the entry flow's pending
//! records in another. Reads never fail: absent or unreadable data falls
//! back to defaults. Writes surface every backend failure.
//! ============================================================================

mod memory;
mod redb_slots;

pub use memory::MemorySlots;
pub use redb_slots::{RedbSlots, DB_PATH_ENV};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::migrate::{migrate_document, Migration};
use crate::staged::StagedRecord;
use crate::types::{now_iso, AppData};

/// Slot holding the persisted `AppData`
pub const APP_DATA_KEY: &str = "clothingAppData";
/// Slot holding the entry flow's staged array
pub const STAGED_KEY: &str = "clothingData";

/// A key-value backend of string slots
pub trait SlotStorage: Send + Sync {
    fn read_slot(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write_slot(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Returns whether the slot existed
    fn remove_slot(&self, key: &str) -> Result<bool, StorageError>;
}

/// What the staged slot held when read
#[derive(Debug, Clone, PartialEq)]
pub enum StagedSlot {
    Empty,
    /// Present but not a JSON array
    Malformed(String),
    Entries(Vec<Value>),
}

pub struct AppStore {
    slots: Box<dyn SlotStorage>,
}

impl AppStore {
    pub fn new(slots: impl SlotStorage + 'static) -> Self {
        Self {
            slots: Box::new(slots),
        }
    }

    // ========================================================================
    // App data
    // ========================================================================

    /// Load and migrate the stored document, or defaults when there is
    /// nothing usable. Defaults are never marked repaired.
    pub fn load(&self) -> Migration {
        let fresh = || Migration {
            data: AppData::initial(),
            repaired: false,
        };
        let raw = match self.slots.read_slot(APP_DATA_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("No stored app data, starting fresh");
                return fresh();
            }
            Err(e) => {
                warn!("Failed to read app data, using defaults: {}", e);
                return fresh();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(parsed) => migrate_document(parsed),
            Err(e) => {
                warn!("Stored app data is not valid JSON, using defaults: {}", e);
                fresh()
            }
        }
    }

    /// Stamp `lastUpdated` and persist.
    pub fn save(&self, data: &mut AppData) -> Result<(), StorageError> {
        data.metadata.last_updated = now_iso();
        let json = serde_json::to_string(data)?;
        self.slots.write_slot(APP_DATA_KEY, &json)?;
        debug!("Saved {} items", data.clothing_items.len());
        Ok(())
    }

    // ========================================================================
    // Staged records
    // ========================================================================

    pub fn load_staged(&self) -> StagedSlot {
        let raw = match self.slots.read_slot(STAGED_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return StagedSlot::Empty,
            Err(e) => {
                warn!("Failed to read staged records: {}", e);
                return StagedSlot::Empty;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => StagedSlot::Entries(entries),
            Ok(other) => StagedSlot::Malformed(format!("expected an array, found {}", other)),
            Err(e) => StagedSlot::Malformed(e.to_string()),
        }
    }

    pub fn clear_staged(&self) -> Result<bool, StorageError> {
        self.slots.remove_slot(STAGED_KEY)
    }

    /// Append one record to the staged array, creating it when absent.
    /// Returns the number of records now staged.
    pub fn stage_record(&self, record: &StagedRecord) -> Result<usize, StorageError> {
        let mut entries = match self.load_staged() {
            StagedSlot::Empty => Vec::new(),
            StagedSlot::Entries(entries) => entries,
            StagedSlot::Malformed(reason) => return Err(StorageError::Corrupt(reason)),
        };
        entries.push(serde_json::to_value(record)?);

        let json = serde_json::to_string(&entries)?;
        self.slots.write_slot(STAGED_KEY, &json)?;
        debug!("Staged record, {} pending", entries.len());
        Ok(entries.len())
    }
}
