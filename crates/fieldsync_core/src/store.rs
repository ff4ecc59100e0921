//! Shared store for one entity collection's data and ledger.

use crate::record::SyncRecord;
use crate::records::{
    data_for_records, entity_record, entity_records, error_ids, initialize_entity_records,
    mark_modified, merge_unsynced_entities, unsynced_ids, unsynced_records, SyncRecords,
};
use crate::results::{apply_sync_results, SyncResults};
use crate::types::{EntityId, SyncTimestamp};
use parking_lot::RwLock;
use std::collections::HashMap;

/// The records and data a push attempt needs for its candidate entities,
/// read atomically from the store.
///
/// The snapshot contains only entities that are genuinely unsynced and still
/// have live data; candidate ids that are already synced, unknown, or have a
/// dangling ledger entry are dropped.
#[derive(Debug, Clone)]
pub struct UnsyncedSnapshot<D, E> {
    /// Ledger records for the surviving entities.
    pub records: SyncRecords<D, E>,
    /// Live data for the surviving entities.
    pub data: HashMap<EntityId, D>,
}

impl<D, E> UnsyncedSnapshot<D, E> {
    /// Returns true if no candidate survived the unsynced filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

struct StoreInner<D, E> {
    data: HashMap<EntityId, D>,
    records: SyncRecords<D, E>,
}

/// Shared mutable state for one entity collection: the live data map and its
/// sync ledger behind a single lock.
///
/// All mutation is expressed as "compute a new record from an old record"
/// (the pure operations in this crate), so each commit is an atomic replace
/// of one entity's entry under the lock. That is sufficient to keep the
/// non-regression invariant intact with one logical writer; readers take
/// cloned snapshots.
pub struct SyncStore<D, E> {
    inner: RwLock<StoreInner<D, E>>,
}

impl<D: Clone, E: Clone> SyncStore<D, E> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                data: HashMap::new(),
                records: HashMap::new(),
            }),
        }
    }

    /// Creates a store for a freshly loaded data set, with every entity
    /// considered already synced.
    #[must_use]
    pub fn with_initial_data(data: HashMap<EntityId, D>) -> Self {
        let records = initialize_entity_records(&data);
        Self {
            inner: RwLock::new(StoreInner { data, records }),
        }
    }

    /// Applies one logical local edit to an entity.
    ///
    /// The update closure receives the current value (if any) and returns
    /// the new one; the data write and the revision bump commit in one
    /// critical section.
    pub fn modify(
        &self,
        id: &EntityId,
        at: SyncTimestamp,
        update: impl FnOnce(Option<&D>) -> D,
    ) {
        let mut inner = self.inner.write();
        let new_value = update(inner.data.get(id));
        inner.data.insert(id.clone(), new_value);
        mark_modified(&mut inner.records, id, at);
    }

    /// Marks an entity as locally modified without changing its data.
    pub fn mark_modified(&self, id: &EntityId, at: SyncTimestamp) {
        let mut inner = self.inner.write();
        mark_modified(&mut inner.records, id, at);
    }

    /// Applies a sync attempt's results, discarding entries whose revision
    /// is no longer current.
    pub fn apply_results(&self, results: &SyncResults<D, E>, at: SyncTimestamp) {
        let mut inner = self.inner.write();
        let StoreInner { data, records } = &mut *inner;
        apply_sync_results(data, records, results, at);
    }

    /// Replaces the store contents with the merge of the current state
    /// against a freshly fetched authoritative data set.
    ///
    /// Entities with pending local edits survive unchanged; everything else
    /// adopts the fresh data.
    pub fn merge_fresh(&self, fresh_data: &HashMap<EntityId, D>) {
        let mut inner = self.inner.write();
        let merged = merge_unsynced_entities(&inner.records, &inner.data, fresh_data);
        tracing::debug!(
            fresh = fresh_data.len(),
            merged = merged.data.len(),
            "reinitialized collection from authoritative data"
        );
        inner.data = merged.data;
        inner.records = merged.records;
    }

    /// Returns the ids of all unsynced entities, sorted.
    pub fn unsynced_ids(&self) -> Vec<EntityId> {
        unsynced_ids(&self.inner.read().records)
    }

    /// Returns the ids of all entities whose last sync attempt failed,
    /// sorted.
    pub fn error_ids(&self) -> Vec<EntityId> {
        error_ids(&self.inner.read().records)
    }

    /// Atomically reads the records and data a push attempt needs for the
    /// given candidate ids.
    ///
    /// Candidates are deduplicated and filtered to those whose record is
    /// unsynced *at read time*; ids whose ledger entry has no matching live
    /// data are dropped as well.
    pub fn unsynced_snapshot(&self, ids: &[EntityId]) -> UnsyncedSnapshot<D, E> {
        let inner = self.inner.read();
        let mut records = unsynced_records(&entity_records(&inner.records, ids));
        let data = data_for_records(&records, &inner.data);
        records.retain(|id, _| data.contains_key(id));
        UnsyncedSnapshot { records, data }
    }

    /// Returns a clone of one entity's data, if present.
    pub fn data(&self, id: &EntityId) -> Option<D> {
        self.inner.read().data.get(id).cloned()
    }

    /// Returns a clone of one entity's record, defaulting to an empty
    /// record for unknown ids.
    pub fn record(&self, id: &EntityId) -> SyncRecord<D, E> {
        entity_record(&self.inner.read().records, id)
    }

    /// Returns a clone of the full data map.
    pub fn data_snapshot(&self) -> HashMap<EntityId, D> {
        self.inner.read().data.clone()
    }

    /// Returns a clone of the full ledger.
    pub fn records_snapshot(&self) -> SyncRecords<D, E> {
        self.inner.read().records.clone()
    }

    /// Returns the number of entities with live data.
    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    /// Returns true if the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }
}

impl<D: Clone, E: Clone> Default for SyncStore<D, E> {
    fn default() -> Self {
        Self::new()
    }
}
