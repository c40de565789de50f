//! ============================================================================
//! Error Types - What the engine reports back to its callers
//! ============================================================================
//! Validation and not-found errors are user-facing notifications; storage
//! errors come from the slot backend (quota, disabled storage, I/O).
//! Read-path corruption never shows up here: it degrades to defaults.
//! ============================================================================

/// Aggregated validation failure. Every violated rule contributes one
/// message; validation never stops at the first problem.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Validation failed: {}", .messages.join(", "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

/// Failure while writing to (or reading from) slot storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage quota exceeded: need {needed} bytes, limit is {limit} bytes")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored slot is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to serialize app data: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    /// Flatten an anyhow chain from a backend into a single message
    pub fn backend(err: anyhow::Error) -> Self {
        StorageError::Backend(format!("{:#}", err))
    }
}

/// Error types for inventory operations
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    #[error("Failed to write backup: {0}")]
    Export(#[source] serde_json::Error),
}
