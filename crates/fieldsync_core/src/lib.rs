//! # Fieldsync Core
//!
//! Synchronization ledger for offline-first field data collection.
//!
//! This crate provides:
//! - Per-entity revision bookkeeping via [`SyncRecord`]
//! - Pure ledger operations (mark modified / synced / errored)
//! - Sync-result application with a staleness guard
//! - Merge of a cached data set against an authoritative refresh
//! - A shared [`SyncStore`] with atomic per-entity updates
//!
//! ## Key Invariants
//!
//! - An entity is unsynced iff its revision id is set and differs from the
//!   last-synced revision id
//! - A successful sync unconditionally clears the last sync error
//! - Sync results are applied only while the revision they were computed
//!   against is still current (stale results are silently discarded)
//! - An un-acknowledged local edit is never overwritten by remote data

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod record;
mod records;
mod results;
mod store;
mod types;

pub use clock::{Clock, SystemClock};
pub use record::SyncRecord;
pub use records::{
    data_for_records, entity_record, entity_records, error_ids, error_records,
    initialize_entity_records, mark_all_errors, mark_all_modified, mark_all_synced, mark_error,
    mark_modified, mark_synced, merge_unsynced_entities, unsynced_ids, unsynced_records,
    MergedEntities, SyncRecords,
};
pub use results::{
    apply_sync_results, is_value_for_current_revision, values_for_current_revisions, SyncResults,
    SyncedValue, SyncedValues,
};
pub use store::{SyncStore, UnsyncedSnapshot};
pub use types::{next_revision_id, revision_ids_match, EntityId, RevisionId, SyncTimestamp};
