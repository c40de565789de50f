//! ============================================================================
//! CLOSET-CORE: Wardrobe Inventory Engine
//! ============================================================================
//! This crate holds all the logic behind the closet app:
//! - Slot storage (redb on disk, in-memory for tests) holding one JSON blob
//! - Schema migration and validation driven by a fixed field table
//! - Inventory CRUD with statistics recomputed after every mutation
//! - One-shot merge of records staged by the separate entry flow
//! - Preference profiles and synthetic recommendations
//! ============================================================================

pub mod backup;
pub mod engine;
pub mod error;
pub mod migrate;
pub mod query;
pub mod recommend;
pub mod schema;
pub mod staged;
pub mod stats;
pub mod store;
pub mod types;
pub mod validate;

// Re-export main types for convenience
pub use backup::Backup;
pub use engine::{InventoryEngine, MergeReport};
pub use error::{InventoryError, StorageError, ValidationError};
pub use query::{SearchFilters, SortOrder};
pub use recommend::{PreferenceProfile, PriceBand, RecommendationItem};
pub use staged::StagedRecord;
pub use stats::PreferenceTone;
pub use store::{AppStore, MemorySlots, RedbSlots, SlotStorage};
pub use types::*;
pub use validate::{ItemInput, Mode, NumericInput};
