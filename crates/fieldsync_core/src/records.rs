//! Ledger operations over collections of sync records.
//!
//! The ledger maps entity ids to [`SyncRecord`]s and is kept index-aligned
//! with the live data map for the same collection: every entity with live
//! data has a ledger entry (possibly empty), and every ledger entry with
//! pending sync state corresponds to a still-present entity.

use crate::record::SyncRecord;
use crate::results::{SyncedValue, SyncedValues};
use crate::types::{EntityId, SyncTimestamp};
use std::collections::HashMap;

/// A collection of sync records keyed by their associated entity ids.
pub type SyncRecords<D, E> = HashMap<EntityId, SyncRecord<D, E>>;

/// Builds a ledger for a freshly loaded data set, with every entity
/// considered already synced.
pub fn initialize_entity_records<D: Clone, E>(
    data: &HashMap<EntityId, D>,
) -> SyncRecords<D, E> {
    data.iter()
        .map(|(id, entity)| (id.clone(), SyncRecord::initial(Some(entity.clone()))))
        .collect()
}

/// Looks up one entity's record, defaulting to an empty record when the id
/// has never been referenced.
pub fn entity_record<D: Clone, E: Clone>(
    records: &SyncRecords<D, E>,
    id: &EntityId,
) -> SyncRecord<D, E> {
    records.get(id).cloned().unwrap_or_default()
}

/// Looks up the records for a set of ids, defaulting missing entries to
/// empty records. Duplicate ids collapse to one entry.
pub fn entity_records<D: Clone, E: Clone>(
    records: &SyncRecords<D, E>,
    ids: &[EntityId],
) -> SyncRecords<D, E> {
    ids.iter()
        .map(|id| (id.clone(), entity_record(records, id)))
        .collect()
}

/// Returns the live data for the entities in `records`, skipping ids that
/// have a ledger entry but no live data.
pub fn data_for_records<D: Clone, E>(
    records: &SyncRecords<D, E>,
    data: &HashMap<EntityId, D>,
) -> HashMap<EntityId, D> {
    records
        .keys()
        .filter_map(|id| data.get(id).map(|entity| (id.clone(), entity.clone())))
        .collect()
}

/// Filters a ledger down to the records with unacknowledged local edits.
pub fn unsynced_records<D: Clone, E: Clone>(records: &SyncRecords<D, E>) -> SyncRecords<D, E> {
    records
        .iter()
        .filter(|(_, record)| record.is_unsynced())
        .map(|(id, record)| (id.clone(), record.clone()))
        .collect()
}

/// Filters a ledger down to the records whose last sync attempt failed.
pub fn error_records<D: Clone, E: Clone>(records: &SyncRecords<D, E>) -> SyncRecords<D, E> {
    records
        .iter()
        .filter(|(_, record)| record.is_error())
        .map(|(id, record)| (id.clone(), record.clone()))
        .collect()
}

/// Returns the ids of all unsynced entities, sorted for stable observation.
pub fn unsynced_ids<D, E>(records: &SyncRecords<D, E>) -> Vec<EntityId> {
    let mut ids: Vec<EntityId> = records
        .iter()
        .filter(|(_, record)| record.is_unsynced())
        .map(|(id, _)| id.clone())
        .collect();
    ids.sort();
    ids
}

/// Returns the ids of all entities in error, sorted for stable observation.
pub fn error_ids<D, E>(records: &SyncRecords<D, E>) -> Vec<EntityId> {
    let mut ids: Vec<EntityId> = records
        .iter()
        .filter(|(_, record)| record.is_error())
        .map(|(id, _)| id.clone())
        .collect();
    ids.sort();
    ids
}

/// Marks one entity as locally modified at time `at`.
pub fn mark_modified<D: Clone, E: Clone>(
    records: &mut SyncRecords<D, E>,
    id: &EntityId,
    at: SyncTimestamp,
) {
    let record = entity_record(records, id).modified(at);
    records.insert(id.clone(), record);
}

/// Marks a set of entities as locally modified at time `at`.
pub fn mark_all_modified<D: Clone, E: Clone>(
    records: &mut SyncRecords<D, E>,
    ids: &[EntityId],
    at: SyncTimestamp,
) {
    for id in ids {
        mark_modified(records, id, at);
    }
}

/// Marks one entity as synced with the given result value.
pub fn mark_synced<D: Clone, E: Clone>(
    records: &mut SyncRecords<D, E>,
    id: &EntityId,
    value: SyncedValue<D>,
    at: SyncTimestamp,
) {
    let record = entity_record(records, id).synced(value.value, value.revision_id, at);
    records.insert(id.clone(), record);
}

/// Marks a batch of entities as synced.
pub fn mark_all_synced<D: Clone, E: Clone>(
    records: &mut SyncRecords<D, E>,
    values: &SyncedValues<D>,
    at: SyncTimestamp,
) {
    for (id, value) in values {
        mark_synced(records, id, value.clone(), at);
    }
}

/// Marks one entity's sync attempt as rejected with the given error value.
pub fn mark_error<D: Clone, E: Clone>(
    records: &mut SyncRecords<D, E>,
    id: &EntityId,
    error: SyncedValue<E>,
    at: SyncTimestamp,
) {
    let record = entity_record(records, id).errored(error.value, error.revision_id, at);
    records.insert(id.clone(), record);
}

/// Marks a batch of entities' sync attempts as rejected.
pub fn mark_all_errors<D: Clone, E: Clone>(
    records: &mut SyncRecords<D, E>,
    errors: &SyncedValues<E>,
    at: SyncTimestamp,
) {
    for (id, error) in errors {
        mark_error(records, id, error.clone(), at);
    }
}

/// The output of [`merge_unsynced_entities`]: a ledger and data map that
/// stay index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntities<D, E> {
    /// The merged ledger.
    pub records: SyncRecords<D, E>,
    /// The merged live data.
    pub data: HashMap<EntityId, D>,
}

/// Reconciles a cached data set and its ledger against a freshly fetched
/// authoritative data set.
///
/// Entities with an unacknowledged local edit keep their cached data and
/// ledger record verbatim; the fresh value is discarded for them. All other
/// entities adopt the fresh value with a reinitialized record. Entities
/// absent from the fresh set with no pending edit are dropped from both
/// outputs.
///
/// This is a whole-entity merge with a "local pending edit always wins"
/// conflict policy; there is no field-level merging.
pub fn merge_unsynced_entities<D: Clone, E: Clone>(
    records: &SyncRecords<D, E>,
    data: &HashMap<EntityId, D>,
    fresh_data: &HashMap<EntityId, D>,
) -> MergedEntities<D, E> {
    let pending = unsynced_records(records);
    let pending_data = data_for_records(&pending, data);

    let mut merged_records = initialize_entity_records(fresh_data);
    let mut merged_data = fresh_data.clone();

    merged_records.extend(pending);
    merged_data.extend(pending_data);

    MergedEntities {
        records: merged_records,
        data: merged_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RevisionId;

    type Ledger = SyncRecords<&'static str, &'static str>;

    fn at(millis: i64) -> SyncTimestamp {
        SyncTimestamp::from_millis(millis)
    }

    fn id(raw: &str) -> EntityId {
        EntityId::from(raw)
    }

    fn data_map(entries: &[(&str, &'static str)]) -> HashMap<EntityId, &'static str> {
        entries.iter().map(|(k, v)| (id(k), *v)).collect()
    }

    #[test]
    fn entity_record_defaults_missing_ids() {
        let ledger = Ledger::new();
        let record = entity_record(&ledger, &id("missing"));
        assert_eq!(record, SyncRecord::empty());
    }

    #[test]
    fn entity_records_collapses_duplicates() {
        let mut ledger = Ledger::new();
        mark_modified(&mut ledger, &id("a"), at(1));

        let subset = entity_records(&ledger, &[id("a"), id("a"), id("b")]);
        assert_eq!(subset.len(), 2);
        assert!(subset[&id("a")].is_unsynced());
        assert_eq!(subset[&id("b")], SyncRecord::empty());
    }

    #[test]
    fn data_for_records_skips_missing_data() {
        let mut ledger = Ledger::new();
        mark_modified(&mut ledger, &id("a"), at(1));
        mark_modified(&mut ledger, &id("ghost"), at(1));

        let data = data_map(&[("a", "x"), ("b", "y")]);
        let subset = data_for_records(&ledger, &data);
        assert_eq!(subset, data_map(&[("a", "x")]));
    }

    #[test]
    fn unsynced_and_error_filters() {
        let mut ledger = Ledger::new();
        mark_modified(&mut ledger, &id("dirty"), at(1));
        mark_modified(&mut ledger, &id("clean"), at(1));
        mark_synced(
            &mut ledger,
            &id("clean"),
            SyncedValue {
                value: "v",
                revision_id: Some(RevisionId::new(1)),
            },
            at(2),
        );
        mark_modified(&mut ledger, &id("bad"), at(3));
        mark_error(
            &mut ledger,
            &id("bad"),
            SyncedValue {
                value: "denied",
                revision_id: Some(RevisionId::new(1)),
            },
            at(4),
        );

        assert_eq!(unsynced_ids(&ledger), vec![id("dirty")]);
        assert_eq!(error_ids(&ledger), vec![id("bad")]);
        assert_eq!(unsynced_records(&ledger).len(), 1);
        assert_eq!(error_records(&ledger).len(), 1);
    }

    #[test]
    fn initialize_entity_records_marks_all_synced() {
        let data = data_map(&[("a", "x"), ("b", "y")]);
        let ledger: Ledger = initialize_entity_records(&data);

        assert_eq!(ledger.len(), 2);
        assert!(!ledger[&id("a")].is_unsynced());
        assert_eq!(ledger[&id("a")].last_synced_data, Some("x"));
    }

    #[test]
    fn merge_keeps_pending_edits() {
        let data = data_map(&[("a", "local"), ("b", "old")]);
        let mut ledger: Ledger = initialize_entity_records(&data);
        mark_modified(&mut ledger, &id("a"), at(5));
        let pending_record = ledger[&id("a")].clone();

        let fresh = data_map(&[("a", "remote"), ("b", "new")]);
        let merged = merge_unsynced_entities(&ledger, &data, &fresh);

        // The pending edit wins over the fresh value, record and all.
        assert_eq!(merged.data[&id("a")], "local");
        assert_eq!(merged.records[&id("a")], pending_record);

        // The synced entity adopts the fresh value with a reset record.
        assert_eq!(merged.data[&id("b")], "new");
        assert_eq!(merged.records[&id("b")], SyncRecord::initial(Some("new")));
    }

    #[test]
    fn merge_drops_upstream_deletions() {
        let data = data_map(&[("kept", "x"), ("gone", "y")]);
        let ledger: Ledger = initialize_entity_records(&data);

        let fresh = data_map(&[("kept", "x2")]);
        let merged = merge_unsynced_entities(&ledger, &data, &fresh);

        assert!(!merged.data.contains_key(&id("gone")));
        assert!(!merged.records.contains_key(&id("gone")));
        assert_eq!(merged.data[&id("kept")], "x2");
    }

    #[test]
    fn merge_keeps_pending_entity_deleted_upstream() {
        let data = data_map(&[("a", "local")]);
        let mut ledger: Ledger = initialize_entity_records(&data);
        mark_modified(&mut ledger, &id("a"), at(1));

        let fresh = HashMap::new();
        let merged = merge_unsynced_entities(&ledger, &data, &fresh);

        assert_eq!(merged.data[&id("a")], "local");
        assert!(merged.records[&id("a")].is_unsynced());
    }

    #[test]
    fn merge_adopts_new_upstream_entities() {
        let merged: MergedEntities<&str, &str> = merge_unsynced_entities(
            &Ledger::new(),
            &HashMap::new(),
            &data_map(&[("new", "v")]),
        );
        assert_eq!(merged.data[&id("new")], "v");
        assert!(!merged.records[&id("new")].is_unsynced());
    }
}
