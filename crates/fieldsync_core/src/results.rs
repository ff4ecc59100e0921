//! Application of sync results to a ledger, with the staleness guard.

use crate::record::SyncRecord;
use crate::records::{entity_record, mark_all_errors, mark_all_synced, SyncRecords};
use crate::types::{revision_ids_match, EntityId, RevisionId, SyncTimestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A value produced by syncing some data at a specified revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedValue<T> {
    /// The synced value.
    pub value: T,
    /// The revision the sync result was computed against.
    pub revision_id: Option<RevisionId>,
}

impl<T> SyncedValue<T> {
    /// Creates a synced value for the given revision.
    pub fn new(value: T, revision_id: Option<RevisionId>) -> Self {
        Self { value, revision_id }
    }
}

/// A collection of synced values keyed by their associated entity ids.
pub type SyncedValues<T> = HashMap<EntityId, SyncedValue<T>>;

/// The outcome of one sync attempt for one collection: per-entity data for
/// acknowledged entities and per-entity errors for rejected ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResults<D, E> {
    /// Entities the authority acknowledged, with the authoritative data.
    pub data: SyncedValues<D>,
    /// Entities the authority rejected, with the rejection value.
    pub errors: SyncedValues<E>,
}

impl<D, E> Default for SyncResults<D, E> {
    fn default() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }
}

impl<D, E> SyncResults<D, E> {
    /// Returns true if the attempt produced neither data nor errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.errors.is_empty()
    }

    /// Returns true if any entity in the attempt was rejected.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Returns true if `value` addresses the record's current revision.
///
/// A result computed against a revision that is no longer current is stale:
/// a concurrent local edit has superseded it, and applying it would clobber
/// the newer edit.
#[must_use]
pub fn is_value_for_current_revision<D, E, T>(
    record: &SyncRecord<D, E>,
    value: &SyncedValue<T>,
) -> bool {
    revision_ids_match(record.revision_id, value.revision_id)
}

/// Filters `values` down to the entries that still address the current
/// revision of their record.
pub fn values_for_current_revisions<D: Clone, E: Clone, T: Clone>(
    records: &SyncRecords<D, E>,
    values: &SyncedValues<T>,
) -> SyncedValues<T> {
    values
        .iter()
        .filter(|(id, value)| {
            is_value_for_current_revision(&entity_record(records, id), value)
        })
        .map(|(id, value)| (id.clone(), value.clone()))
        .collect()
}

/// Applies one sync attempt's results to a collection's data map and ledger.
///
/// Results addressing revisions that are no longer current are silently
/// discarded, entity by entity; this is expected under concurrent editing,
/// not an error. Surviving successes are marked synced and their data is
/// written to the live map; surviving errors are marked on the ledger. There
/// is no ordering or atomicity across entities.
pub fn apply_sync_results<D: Clone, E: Clone>(
    data: &mut HashMap<EntityId, D>,
    records: &mut SyncRecords<D, E>,
    results: &SyncResults<D, E>,
    at: SyncTimestamp,
) {
    let up_to_date_data = values_for_current_revisions(records, &results.data);
    let up_to_date_errors = values_for_current_revisions(records, &results.errors);

    let stale =
        (results.data.len() - up_to_date_data.len()) + (results.errors.len() - up_to_date_errors.len());
    if stale > 0 {
        tracing::debug!(stale, "discarding sync results for superseded revisions");
    }

    mark_all_synced(records, &up_to_date_data, at);
    for (id, value) in &up_to_date_data {
        data.insert(id.clone(), value.value.clone());
    }

    mark_all_errors(records, &up_to_date_errors, at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::mark_modified;

    type Ledger = SyncRecords<&'static str, &'static str>;

    fn at(millis: i64) -> SyncTimestamp {
        SyncTimestamp::from_millis(millis)
    }

    fn id(raw: &str) -> EntityId {
        EntityId::from(raw)
    }

    #[test]
    fn apply_marks_successes_and_errors_independently() {
        let mut data = HashMap::new();
        data.insert(id("a"), "old-a");
        data.insert(id("b"), "old-b");

        let mut ledger = Ledger::new();
        mark_modified(&mut ledger, &id("a"), at(1));
        mark_modified(&mut ledger, &id("b"), at(1));

        let mut results = SyncResults::default();
        results
            .data
            .insert(id("a"), SyncedValue::new("new-a", Some(RevisionId::new(1))));
        results
            .errors
            .insert(id("b"), SyncedValue::new("denied", Some(RevisionId::new(1))));

        apply_sync_results(&mut data, &mut ledger, &results, at(2));

        assert!(!ledger[&id("a")].is_unsynced());
        assert_eq!(data[&id("a")], "new-a");

        assert!(ledger[&id("b")].is_error());
        assert!(!ledger[&id("b")].is_unsynced());
        assert_eq!(data[&id("b")], "old-b");
    }

    #[test]
    fn apply_discards_stale_results() {
        let mut data = HashMap::new();
        data.insert(id("a"), "edited-again");

        let mut ledger = Ledger::new();
        mark_modified(&mut ledger, &id("a"), at(1));
        mark_modified(&mut ledger, &id("a"), at(2));
        let before = ledger[&id("a")].clone();

        // A result computed against revision 1 arrives after the second edit.
        let mut results = SyncResults::default();
        results
            .data
            .insert(id("a"), SyncedValue::new("stale", Some(RevisionId::new(1))));

        apply_sync_results(&mut data, &mut ledger, &results, at(3));

        assert_eq!(ledger[&id("a")], before);
        assert_eq!(data[&id("a")], "edited-again");
        assert!(ledger[&id("a")].is_unsynced());
    }

    #[test]
    fn stale_error_does_not_mark_record() {
        let mut data = HashMap::new();
        let mut ledger = Ledger::new();
        mark_modified(&mut ledger, &id("a"), at(1));
        mark_modified(&mut ledger, &id("a"), at(2));

        let mut results = SyncResults::default();
        results
            .errors
            .insert(id("a"), SyncedValue::new("denied", Some(RevisionId::new(1))));

        apply_sync_results(&mut data, &mut ledger, &results, at(3));

        assert!(!ledger[&id("a")].is_error());
        assert_eq!(ledger[&id("a")].last_synced_revision_id, None);
    }

    #[test]
    fn acknowledged_revision_becomes_synced() {
        let mut data = HashMap::from([(id("a"), "x")]);
        let mut ledger = Ledger::new();
        ledger.insert(
            id("a"),
            SyncRecord {
                revision_id: Some(RevisionId::new(1)),
                last_synced_revision_id: Some(RevisionId::new(0)),
                ..SyncRecord::default()
            },
        );
        assert!(ledger[&id("a")].is_unsynced());

        let mut results = SyncResults::default();
        results
            .data
            .insert(id("a"), SyncedValue::new("x", Some(RevisionId::new(1))));
        apply_sync_results(&mut data, &mut ledger, &results, at(1));

        assert!(!ledger[&id("a")].is_unsynced());
        assert_eq!(
            ledger[&id("a")].last_synced_revision_id,
            Some(RevisionId::new(1))
        );
    }

    #[test]
    fn value_for_never_modified_record_applies() {
        // A record with no revision matches a result with no revision, which
        // is how freshly initialized entities accept authoritative data.
        let record: SyncRecord<&str, &str> = SyncRecord::empty();
        let value = SyncedValue::new("v", None);
        assert!(is_value_for_current_revision(&record, &value));
    }

    #[test]
    fn results_emptiness() {
        let mut results: SyncResults<&str, &str> = SyncResults::default();
        assert!(results.is_empty());
        assert!(!results.has_errors());

        results
            .errors
            .insert(id("a"), SyncedValue::new("denied", None));
        assert!(!results.is_empty());
        assert!(results.has_errors());
    }
}
