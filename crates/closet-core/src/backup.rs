//! ============================================================================
//! Backup - Export and import of the whole app document
//! ============================================================================

use std::io::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InventoryError;
use crate::migrate::migrate;
use crate::types::{now_iso, AppData};

/// Exported document: `{data, timestamp, version}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub data: AppData,
    pub timestamp: String,
    pub version: String,
}

impl Backup {
    pub fn new(data: AppData) -> Self {
        Self {
            version: data.version.clone(),
            timestamp: now_iso(),
            data,
        }
    }

    /// Pretty-printed JSON, two-space indent
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), InventoryError> {
        serde_json::to_writer_pretty(writer, self).map_err(InventoryError::Export)
    }
}

/// Suggested download name, e.g. `clothing-app-backup-2024-05-01.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("clothing-app-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Check the envelope of an imported backup and migrate its payload.
pub fn read_backup(payload: Value) -> Result<AppData, InventoryError> {
    let Value::Object(mut envelope) = payload else {
        return Err(InventoryError::InvalidBackup("not a JSON object".to_string()));
    };

    match envelope.get("version") {
        Some(Value::String(v)) if !v.is_empty() => {}
        Some(Value::Null) | None => {
            return Err(InventoryError::InvalidBackup("missing version".to_string()))
        }
        Some(Value::String(_)) => {
            return Err(InventoryError::InvalidBackup("empty version".to_string()))
        }
        Some(_) => {
            return Err(InventoryError::InvalidBackup("version is not a string".to_string()))
        }
    }

    match envelope.remove("data") {
        Some(data @ Value::Object(_)) => Ok(migrate(data)),
        Some(Value::Null) | None => Err(InventoryError::InvalidBackup("missing data".to_string())),
        Some(_) => Err(InventoryError::InvalidBackup("data is not an object".to_string())),
    }
}
