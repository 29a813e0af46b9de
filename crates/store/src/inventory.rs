//! Concurrent in-memory inventory registry.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};

use stockroom_core::{Record, RecordId};

/// Thread-safe id→[`Record`] registry.
///
/// Every operation takes `&self` and is atomic with respect to the map
/// structure; callers on any thread need no external locking. A sequence of
/// operations ("find then update") is NOT atomic as a whole — the design
/// accepts check-then-act races, matching the contract the presentation
/// layer was written against.
///
/// Reads clone out. The internal lock is never exposed and no returned value
/// aliases live map state, so a [`list`](Self::list) snapshot stays valid
/// whatever happens to the store afterwards.
#[derive(Debug, Default)]
pub struct InventoryStore {
    records: RwLock<HashMap<RecordId, Record>>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert or overwrite the entry at `record.id`.
    ///
    /// Never fails; concurrent adds to the same id resolve last-writer-wins.
    pub fn add(&self, record: Record) {
        let mut records = self.records.write().unwrap();
        records.insert(record.id, record);
    }

    /// Delete the entry if present, returning it.
    ///
    /// Removing an absent id is a no-op, not an error.
    pub fn remove(&self, id: RecordId) -> Option<Record> {
        let mut records = self.records.write().unwrap();
        records.remove(&id)
    }

    /// Look up a record by id. Absence is data, not an error.
    pub fn find_by_id(&self, id: RecordId) -> Option<Record> {
        let records = self.records.read().unwrap();
        records.get(&id).cloned()
    }

    /// Replace the entry at `record.id` **only if it already exists**.
    ///
    /// Returns whether a replacement happened; an absent id leaves the store
    /// untouched. Callers wanting upsert semantics use [`add`](Self::add).
    pub fn update(&self, record: Record) -> bool {
        let mut records = self.records.write().unwrap();
        match records.entry(record.id) {
            Entry::Occupied(mut entry) => {
                entry.insert(record);
                true
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Point-in-time snapshot of all current records, in unspecified order.
    ///
    /// Consumers needing determinism sort by id (export does).
    pub fn list(&self) -> Vec<Record> {
        let records = self.records.read().unwrap();
        records.values().cloned().collect()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        let mut records = self.records.write().unwrap();
        records.clear();
    }

    pub fn len(&self) -> usize {
        let records = self.records.read().unwrap();
        records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of `unit_price × quantity` over a single consistent snapshot.
    pub fn total_value(&self) -> f64 {
        let records = self.records.read().unwrap();
        records.values().map(Record::line_value).sum()
    }
}
