//! ============================================================================
//! Inventory Engine - The canonical collection and everything that edits it
//! ============================================================================
//! One engine per store, constructed explicitly and passed by reference.
//! Every mutation is applied to a copy of the document, persisted, and only
//! then swapped in, so a failed write leaves the in-memory state as it was.
//! ============================================================================

use std::io::Write;

use chrono::Utc;
use rand::Rng;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::backup::{self, Backup};
use crate::error::{InventoryError, StorageError};
use crate::migrate::Migration;
use crate::query::{self, SearchFilters, SortOrder};
use crate::recommend::{self, RecommendationItem};
use crate::staged::StagedRecord;
use crate::stats;
use crate::store::{AppStore, StagedSlot};
use crate::types::{new_item_id, now_iso, AppData, ClothingItem, Statistics};
use crate::validate::{validate, ItemInput, Mode};

/// Outcome of folding the staged records into the collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    /// Same name and createdAt as an existing item
    pub duplicates: usize,
    /// Entries that could not be read as staged records
    pub malformed: usize,
}

pub struct InventoryEngine {
    store: AppStore,
    data: AppData,
}

impl InventoryEngine {
    /// Load (and migrate) the stored document, recompute statistics, then
    /// fold in anything the entry flow has staged. A failed merge is logged
    /// and left for the next open.
    pub fn open(store: AppStore) -> Self {
        let mut engine = Self::load(store);
        match engine.merge_staged() {
            Ok(report) if report.added > 0 => {
                info!("Merged {} staged items on open", report.added)
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to merge staged records: {}", e),
        }
        engine
    }

    /// Load without touching the staged records. When migration had to
    /// assign ids or restamp the version the result is written back so the
    /// next load sees the same document; a failed write is only logged.
    pub fn load(store: AppStore) -> Self {
        let Migration { mut data, repaired } = store.load();
        data.statistics = stats::compute(&data.clothing_items);
        if repaired {
            match store.save(&mut data) {
                Ok(()) => info!("Persisted migrated app data"),
                Err(e) => warn!("Failed to persist migrated app data: {}", e),
            }
        }
        info!("Inventory loaded: {} items", data.clothing_items.len());
        Self { store, data }
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    pub fn create(&mut self, input: &ItemInput) -> Result<ClothingItem, InventoryError> {
        let validated = validate(input, Mode::Create)?;
        let now = now_iso();
        let item = ClothingItem {
            id: new_item_id(),
            fields: validated.fields,
            preferences: validated.preferences,
            created_at: now.clone(),
            updated_at: now,
            extra: Map::new(),
        };

        let mut next = self.data.clone();
        next.clothing_items.push(item.clone());
        self.commit(next)?;

        info!("Added item {} ({})", item.id, item.fields.name);
        Ok(item)
    }

    /// Merge the supplied fields into an existing item.
    pub fn update(&mut self, id: &str, input: &ItemInput) -> Result<ClothingItem, InventoryError> {
        let index = self
            .data
            .find_index(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;
        let validated = validate(input, Mode::Update)?;

        let mut next = self.data.clone();
        let item = &mut next.clothing_items[index];
        validated.apply_to(item);
        item.updated_at = now_iso();
        let updated = item.clone();
        self.commit(next)?;

        info!("Updated item {}", id);
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, InventoryError> {
        let index = self
            .data
            .find_index(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        let mut next = self.data.clone();
        let removed = next.clothing_items.remove(index);
        self.commit(next)?;

        info!("Deleted item {} ({})", id, removed.fields.name);
        Ok(true)
    }

    pub fn get_item(&self, id: &str) -> Option<ClothingItem> {
        self.data
            .find_index(id)
            .map(|index| self.data.clothing_items[index].clone())
    }

    pub fn get_all_items(&self) -> Vec<ClothingItem> {
        self.data.clothing_items.clone()
    }

    pub fn get_statistics(&self) -> Statistics {
        self.data.statistics.clone()
    }

    pub fn get_data(&self) -> AppData {
        self.data.clone()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn search_items(&self, query: &str, filters: &SearchFilters) -> Vec<ClothingItem> {
        query::search(&self.data.clothing_items, query, filters)
    }

    pub fn sort_items(&self, items: &[ClothingItem], field: &str, order: SortOrder) -> Vec<ClothingItem> {
        query::sort_items(items, field, order)
    }

    // ========================================================================
    // Staged input
    // ========================================================================

    /// Fold staged records into the collection, skipping any whose name and
    /// createdAt already appear. The stage is cleared only after the
    /// collection has been persisted.
    pub fn merge_staged(&mut self) -> Result<MergeReport, InventoryError> {
        let entries = match self.store.load_staged() {
            StagedSlot::Empty => {
                debug!("No staged records");
                return Ok(MergeReport::default());
            }
            StagedSlot::Malformed(reason) => {
                warn!("Staged records are not an array, leaving them alone: {}", reason);
                return Ok(MergeReport::default());
            }
            StagedSlot::Entries(entries) => entries,
        };

        info!("Merging {} staged records", entries.len());
        let mut report = MergeReport::default();
        let mut next = self.data.clone();

        for (index, entry) in entries.into_iter().enumerate() {
            let record: StagedRecord = match serde_json::from_value(entry) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping staged record {}: {}", index, e);
                    report.malformed += 1;
                    continue;
                }
            };

            let item = record.to_item(new_item_id());
            let duplicate = next.clothing_items.iter().any(|existing| {
                existing.fields.name == item.fields.name && existing.created_at == item.created_at
            });
            if duplicate {
                debug!("Skipping duplicate staged item: {}", item.fields.name);
                report.duplicates += 1;
                continue;
            }

            debug!("Adding staged item: {}", item.fields.name);
            next.clothing_items.push(item);
            report.added += 1;
        }

        if report.added > 0 {
            self.commit(next)?;
        }
        self.store.clear_staged()?;

        info!(
            "Staged merge complete: {} added, {} duplicates, {} malformed",
            report.added, report.duplicates, report.malformed
        );
        Ok(report)
    }

    /// Add one entry-flow record directly, without the duplicate check.
    pub fn add_staged(&mut self, record: &StagedRecord) -> Result<ClothingItem, InventoryError> {
        let item = record.to_item(new_item_id());

        let mut next = self.data.clone();
        next.clothing_items.push(item.clone());
        self.commit(next)?;

        info!("Added staged item {} ({})", item.id, item.fields.name);
        Ok(item)
    }

    // ========================================================================
    // Recommendations
    // ========================================================================

    pub fn generate_recommendations(&self, count: usize) -> Vec<RecommendationItem> {
        self.generate_recommendations_with(count, &mut rand::thread_rng())
    }

    /// Same as `generate_recommendations` with a caller-supplied random
    /// source for the match score.
    pub fn generate_recommendations_with<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Vec<RecommendationItem> {
        debug!("Generating {} recommendations", count);
        recommend::generate(
            &self.data.clothing_items,
            count,
            Utc::now().timestamp_millis(),
            rng,
        )
    }

    // ========================================================================
    // Backup / restore / reset
    // ========================================================================

    pub fn create_backup(&self) -> Backup {
        Backup::new(self.get_data())
    }

    /// Write a pretty-printed backup and return what was written.
    pub fn write_backup<W: Write>(&self, writer: W) -> Result<Backup, InventoryError> {
        let backup = self.create_backup();
        backup.write_to(writer)?;
        info!("Backup written ({} items)", backup.data.clothing_items.len());
        Ok(backup)
    }

    /// Replace everything with the contents of a backup document.
    pub fn restore_backup(&mut self, payload: Value) -> Result<(), InventoryError> {
        let data = backup::read_backup(payload)?;
        self.commit(data)?;
        info!("Restored backup: {} items", self.data.clothing_items.len());
        Ok(())
    }

    /// Reset to the first-launch document and persist it.
    pub fn clear_all_data(&mut self) -> Result<(), InventoryError> {
        self.commit(AppData::initial())?;
        info!("Cleared all data");
        Ok(())
    }

    /// Recompute statistics on `next`, persist it, then make it current.
    fn commit(&mut self, mut next: AppData) -> Result<(), StorageError> {
        next.statistics = stats::compute(&next.clothing_items);
        self.store.save(&mut next)?;
        self.data = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{self, NumericField, TextField};
    use crate::store::{MemorySlots, SlotStorage, APP_DATA_KEY, STAGED_KEY};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn open(slots: &MemorySlots) -> InventoryEngine {
        InventoryEngine::open(AppStore::new(slots.clone()))
    }

    fn named(name: &str) -> ItemInput {
        ItemInput::default().with_text(TextField::Name, name)
    }

    fn categorized(name: &str, category: &str) -> ItemInput {
        named(name).with_text(TextField::Category, category)
    }

    fn staged(name: &str, timestamp: &str) -> StagedRecord {
        StagedRecord {
            timestamp: Some(timestamp.to_string()),
            ..StagedRecord::default()
        }
        .with_text(TextField::Name, name)
        .with_slider(NumericField::Emotion, 80.0)
    }

    #[test]
    fn test_create_then_get_all() {
        let slots = MemorySlots::new();
        let mut engine = open(&slots);
        let input = named("Silk blouse")
            .with_numeric(NumericField::ColorHue, 30.0)
            .with_numeric(NumericField::Price, 80.0)
            .with_numeric(NumericField::Emotion, 90.0);

        let item = engine.create(&input).unwrap();
        let all = engine.get_all_items();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], item);
        // (30 + 80 + 50 + 50 + 90 + 50 + 50) / 7 = 57.14
        assert_eq!(item.preferences.overall, 57.0);
        assert_eq!(item.preferences.overall, schema::overall_preference(&item.fields));
        assert_eq!(item.created_at, item.updated_at);
        assert_eq!(engine.get_item(&item.id), Some(item));
    }

    #[test]
    fn test_statistics_track_every_mutation() {
        let slots = MemorySlots::new();
        let mut engine = open(&slots);

        let a = engine.create(&categorized("Tee", "tops")).unwrap();
        assert_eq!(engine.get_statistics().total_items, 1);
        engine.create(&categorized("Polo", "tops")).unwrap();
        engine.create(&categorized("Sneakers", "shoes")).unwrap();
        assert_eq!(engine.get_statistics().total_items, engine.get_all_items().len());
        assert_eq!(engine.get_statistics().favorite_category.as_deref(), Some("tops"));

        engine.delete(&a.id).unwrap();
        let stats = engine.get_statistics();
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.category_distribution["tops"], 1);

        let polo = engine.get_all_items()[0].id.clone();
        engine
            .update(&polo, &ItemInput::default().with_text(TextField::Category, "shoes"))
            .unwrap();
        assert_eq!(engine.get_statistics().favorite_category.as_deref(), Some("shoes"));
        assert_eq!(engine.get_data().statistics, engine.get_statistics());
    }

    #[test]
    fn test_single_item_price_range() {
        let mut engine = open(&MemorySlots::new());
        engine
            .create(&named("Coat").with_numeric(NumericField::Price, 100.0))
            .unwrap();
        let range = engine.get_statistics().price_range;
        assert_eq!((range.min, range.max, range.average), (100.0, 100.0, 100.0));
    }

    #[test]
    fn test_validation_errors_are_aggregated() {
        let mut engine = open(&MemorySlots::new());
        let input = named("x".repeat(101).as_str()).with_numeric(NumericField::FitValue, 101.0);

        match engine.create(&input) {
            Err(InventoryError::Validation(err)) => assert!(err.messages.len() >= 2),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(engine.get_all_items().is_empty());
    }

    #[test]
    fn test_update_merges_and_refreshes() {
        let slots = MemorySlots::new();
        let stored = json!({
            "version": "1.1.0",
            "clothingItems": [{
                "id": "chinos",
                "name": "Chinos",
                "category": "bottoms",
                "price": 40,
                "preferences": {
                    "color": 0, "price": 40, "silhouette": 50, "material": 50,
                    "emotion": 50, "fit": 50, "values": 50, "overall": 41
                },
                "createdAt": "2020-01-01T00:00:00.000Z",
                "updatedAt": "2020-01-01T00:00:00.000Z"
            }]
        });
        slots.write_slot(APP_DATA_KEY, &stored.to_string()).unwrap();
        let mut engine = open(&slots);
        let created = engine.get_item("chinos").unwrap();

        let updated = engine
            .update(&created.id, &ItemInput::default().with_numeric(NumericField::Values, 100.0))
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.fields.name, "Chinos");
        assert_eq!(updated.fields.category, "bottoms");
        assert_eq!(updated.fields.price, 40.0);
        assert_eq!(updated.fields.values, 100.0);
        assert_eq!(updated.created_at, created.created_at);
        assert_ne!(updated.updated_at, created.updated_at);
        assert!(chrono::DateTime::parse_from_rfc3339(&updated.updated_at).is_ok());
        assert_eq!(updated.preferences.values, 100.0);
        assert_eq!(updated.preferences.overall, schema::overall_preference(&updated.fields));
    }

    #[test]
    fn test_update_and_delete_unknown_id() {
        let mut engine = open(&MemorySlots::new());
        assert!(matches!(
            engine.update("missing", &named("x")),
            Err(InventoryError::NotFound(id)) if id == "missing"
        ));
        assert!(matches!(engine.delete("missing"), Err(InventoryError::NotFound(_))));
    }

    #[test]
    fn test_update_rejects_invalid_patch() {
        let mut engine = open(&MemorySlots::new());
        let item = engine.create(&named("Vest")).unwrap();
        let err = engine
            .update(&item.id, &ItemInput::default().with_numeric(NumericField::Price, -1.0))
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert_eq!(engine.get_item(&item.id), Some(item));
    }

    #[test]
    fn test_changes_persist_across_reopen() {
        let slots = MemorySlots::new();
        let id = {
            let mut engine = open(&slots);
            engine.create(&categorized("Parka", "outerwear")).unwrap().id
        };

        let engine = open(&slots);
        let item = engine.get_item(&id).unwrap();
        assert_eq!(item.fields.name, "Parka");
        assert_eq!(engine.get_statistics().total_items, 1);
    }

    #[test]
    fn test_assigned_ids_survive_reopen() {
        let slots = MemorySlots::new();
        slots
            .write_slot(APP_DATA_KEY, r#"{"version":"1.1.0","clothingItems":[{"name":"Scarf"}]}"#)
            .unwrap();

        let id = open(&slots).get_all_items()[0].id.clone();
        let mut engine = open(&slots);
        assert_eq!(engine.get_item(&id).map(|i| i.fields.name).as_deref(), Some("Scarf"));
        assert!(engine.delete(&id).unwrap());
        assert!(open(&slots).get_all_items().is_empty());
    }

    #[test]
    fn test_legacy_version_is_written_back_once() {
        let slots = MemorySlots::new();
        let legacy = json!({
            "version": "1.0.0",
            "clothingItems": [{ "id": "p1", "name": "Pea coat" }],
            "metadata": { "createdAt": "2023-01-01T00:00:00.000Z", "lastUpdated": "2023-01-01T00:00:00.000Z", "version": "1.0.0" }
        });
        slots.write_slot(APP_DATA_KEY, &legacy.to_string()).unwrap();

        let first = open(&slots).get_data();
        let stored: Value = serde_json::from_str(&slots.read_slot(APP_DATA_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored["version"], "1.1.0");
        assert_eq!(stored["metadata"]["version"], "1.1.0");

        let second = open(&slots).get_data();
        assert_eq!(second.metadata.last_updated, first.metadata.last_updated);
        assert_eq!(second.clothing_items, first.clothing_items);
    }

    #[test]
    fn test_repair_write_failure_still_loads() {
        let slots = MemorySlots::new();
        slots
            .write_slot(APP_DATA_KEY, r#"{"version":"1.0.0","clothingItems":[{"name":"Mittens"}]}"#)
            .unwrap();
        slots.set_fail_writes(true);

        let engine = open(&slots);
        assert_eq!(engine.get_all_items()[0].fields.name, "Mittens");
        assert_eq!(engine.get_data().version, "1.1.0");
        assert!(slots.read_slot(APP_DATA_KEY).unwrap().unwrap().contains("1.0.0"));
    }

    #[test]
    fn test_storage_failure_leaves_state_unchanged() {
        let slots = MemorySlots::new();
        let mut engine = open(&slots);
        let kept = engine.create(&named("Beanie")).unwrap();
        let before = engine.get_data();

        slots.set_fail_writes(true);
        assert!(matches!(engine.create(&named("Gloves")), Err(InventoryError::Storage(_))));
        assert!(matches!(engine.delete(&kept.id), Err(InventoryError::Storage(_))));
        assert!(engine.clear_all_data().is_err());
        assert_eq!(engine.get_data(), before);

        slots.set_fail_writes(false);
        slots.set_quota(Some(64));
        assert!(matches!(
            engine.create(&named("Gloves")),
            Err(InventoryError::Storage(StorageError::QuotaExceeded { .. }))
        ));
        assert_eq!(engine.get_data(), before);
    }

    #[test]
    fn test_corrupt_store_loads_defaults() {
        let slots = MemorySlots::new();
        slots.write_slot(APP_DATA_KEY, "]]]").unwrap();
        let engine = open(&slots);
        assert!(engine.get_all_items().is_empty());
        assert_eq!(engine.get_statistics().total_items, 0);
    }

    #[test]
    fn test_open_merges_staged_records() {
        let slots = MemorySlots::new();
        let store = AppStore::new(slots.clone());
        store.stage_record(&staged("Linen shirt", "2024-06-01T09:00:00.000Z")).unwrap();
        store.stage_record(&staged("Straw hat", "2024-06-01T09:05:00.000Z")).unwrap();

        let engine = InventoryEngine::open(store);
        let names: Vec<_> = engine.get_all_items().into_iter().map(|i| i.fields.name).collect();
        assert_eq!(names, vec!["Linen shirt", "Straw hat"]);
        assert_eq!(engine.get_statistics().total_items, 2);
        assert!(slots.read_slot(STAGED_KEY).unwrap().is_none());
    }

    #[test]
    fn test_load_leaves_stage_pending() {
        let slots = MemorySlots::new();
        let store = AppStore::new(slots.clone());
        store.stage_record(&staged("Tie", "2024-06-05T00:00:00.000Z")).unwrap();

        let mut engine = InventoryEngine::load(store);
        assert!(engine.get_all_items().is_empty());
        assert!(slots.read_slot(STAGED_KEY).unwrap().is_some());

        assert_eq!(engine.merge_staged().unwrap().added, 1);
    }

    #[test]
    fn test_merging_twice_never_duplicates() {
        let slots = MemorySlots::new();
        let store = AppStore::new(slots.clone());
        let record = staged("Linen shirt", "2024-06-01T09:00:00.000Z");
        store.stage_record(&record).unwrap();
        store.stage_record(&record).unwrap();

        let mut engine = InventoryEngine::open(store);
        assert_eq!(engine.get_all_items().len(), 1);

        AppStore::new(slots.clone()).stage_record(&record).unwrap();
        let report = engine.merge_staged().unwrap();
        assert_eq!(report, MergeReport { added: 0, duplicates: 1, malformed: 0 });
        assert_eq!(engine.get_all_items().len(), 1);
        assert!(slots.read_slot(STAGED_KEY).unwrap().is_none());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let slots = MemorySlots::new();
        let mut engine = open(&slots);
        let batch = json!([
            { "tableData": { "商品名": "Cardigan" }, "sliderData": { "fitSlider": 65 }, "timestamp": "2024-06-02T00:00:00.000Z" },
            "not a record",
            { "tableData": ["wrong"] },
            { "tableData": { "商品名": 501, "カテゴリ": "bottoms" }, "timestamp": "2024-06-02T00:01:00.000Z" }
        ]);
        slots.write_slot(STAGED_KEY, &batch.to_string()).unwrap();

        let report = engine.merge_staged().unwrap();
        assert_eq!(report, MergeReport { added: 2, duplicates: 0, malformed: 2 });
        let items = engine.get_all_items();
        assert_eq!(items[0].fields.fit_value, 65.0);
        assert_eq!(items[1].fields.name, "501");
    }

    #[test]
    fn test_malformed_slot_is_left_alone() {
        let slots = MemorySlots::new();
        slots.write_slot(STAGED_KEY, "{\"oops\":true}").unwrap();
        let engine = open(&slots);
        assert!(engine.get_all_items().is_empty());
        assert_eq!(slots.read_slot(STAGED_KEY).unwrap().as_deref(), Some("{\"oops\":true}"));
    }

    #[test]
    fn test_failed_merge_keeps_stage() {
        let slots = MemorySlots::new();
        AppStore::new(slots.clone())
            .stage_record(&staged("Raincoat", "2024-06-03T00:00:00.000Z"))
            .unwrap();

        slots.set_fail_writes(true);
        let mut engine = open(&slots);
        assert!(engine.get_all_items().is_empty());
        assert!(slots.read_slot(STAGED_KEY).unwrap().is_some());

        slots.set_fail_writes(false);
        let report = engine.merge_staged().unwrap();
        assert_eq!(report.added, 1);
        assert!(slots.read_slot(STAGED_KEY).unwrap().is_none());
    }

    #[test]
    fn test_add_staged_skips_duplicate_check() {
        let mut engine = open(&MemorySlots::new());
        let record = staged("Socks", "2024-06-04T00:00:00.000Z");
        engine.add_staged(&record).unwrap();
        let second = engine.add_staged(&record).unwrap();
        assert_eq!(engine.get_all_items().len(), 2);
        assert_eq!(second.created_at, "2024-06-04T00:00:00.000Z");
        assert_eq!(second.fields.emotion, 80.0);
    }

    #[test]
    fn test_recommendations() {
        let mut engine = open(&MemorySlots::new());
        let defaults = engine.generate_recommendations(3);
        let categories: Vec<_> = defaults.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["tops", "bottoms", "outerwear"]);
        assert!(defaults.iter().all(|r| r.match_score == 75));

        engine.create(&categorized("Boots", "shoes")).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let recs = engine.generate_recommendations_with(2, &mut rng);
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.category == "shoes"));
        assert!(recs.iter().all(|r| r.id.starts_with("rec_") && !r.id.starts_with("rec_default")));
        assert!(recs.iter().all(|r| (70..100).contains(&r.match_score)));
    }

    #[test]
    fn test_sort_round_trip_through_engine() {
        let mut engine = open(&MemorySlots::new());
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            engine
                .add_staged(&staged(name, &format!("2024-01-0{}T00:00:00.000Z", i + 1)))
                .unwrap();
        }
        let items = engine.get_all_items();
        let desc = engine.sort_items(&items, "createdAt", SortOrder::Desc);
        let asc = engine.sort_items(&desc, "createdAt", SortOrder::Asc);
        assert_eq!(asc.iter().rev().cloned().collect::<Vec<_>>(), desc);
        assert_eq!(asc, items);
    }

    #[test]
    fn test_search_through_engine() {
        let mut engine = open(&MemorySlots::new());
        engine.create(&categorized("Denim jacket", "outerwear")).unwrap();
        engine.create(&categorized("Denim jeans", "bottoms")).unwrap();
        let filters = SearchFilters {
            category: Some("bottoms".to_string()),
            ..SearchFilters::default()
        };
        let found = engine.search_items("denim", &filters);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fields.name, "Denim jeans");
    }

    #[test]
    fn test_backup_and_restore() {
        let slots = MemorySlots::new();
        let mut engine = open(&slots);
        engine.create(&categorized("Trench", "outerwear")).unwrap();

        let mut buf = Vec::new();
        let backup = engine.write_backup(&mut buf).unwrap();
        assert_eq!(backup.version, "1.1.0");
        let payload: Value = serde_json::from_slice(&buf).unwrap();

        engine.clear_all_data().unwrap();
        assert!(engine.get_all_items().is_empty());

        engine.restore_backup(payload).unwrap();
        assert_eq!(engine.get_all_items().len(), 1);
        assert_eq!(engine.get_statistics().total_items, 1);

        let reopened = open(&slots);
        assert_eq!(reopened.get_all_items()[0].fields.name, "Trench");
    }

    #[test]
    fn test_restore_rejects_bad_envelope() {
        let mut engine = open(&MemorySlots::new());
        engine.create(&named("Keep me")).unwrap();

        let missing_version = json!({ "data": { "clothingItems": [] } });
        let missing_data = json!({ "version": "1.1.0" });
        for payload in [missing_version, missing_data] {
            assert!(matches!(
                engine.restore_backup(payload),
                Err(InventoryError::InvalidBackup(_))
            ));
        }
        assert_eq!(engine.get_all_items().len(), 1);
    }

    #[test]
    fn test_clear_all_data_persists() {
        let slots = MemorySlots::new();
        let mut engine = open(&slots);
        engine.create(&named("Scarf")).unwrap();
        engine.clear_all_data().unwrap();
        assert!(open(&slots).get_all_items().is_empty());
    }
}
