//! The push action: select, batch, send, and partition results.

use crate::error::EngineResult;
use crate::store::UserDataStore;
use crate::transport::PushTransport;
use fieldsync_core::{
    entity_record, EntityId, SyncRecords, SyncResults, SyncedValue, UnsyncedSnapshot,
};
use fieldsync_protocol::{
    PushEntry, PushFailureReason, PushRequest, PushResponse, PushResult, PushResultEntry,
    SiteMetadata, SoilData,
};

/// The candidate entity ids for one push attempt, per collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushInput {
    /// Candidate site ids for the soil data collection.
    pub soil_data_ids: Vec<EntityId>,
    /// Candidate site ids for the site metadata collection.
    pub site_metadata_ids: Vec<EntityId>,
}

impl PushInput {
    /// Returns true if no collection has any candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.soil_data_ids.is_empty() && self.site_metadata_ids.is_empty()
    }
}

/// Per-collection results of one push attempt.
///
/// A collection that was not part of the attempt (or whose response was
/// absent) is `None`, which is observably different from "attempted with
/// zero entries".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushUserDataResults {
    /// Results for the soil data collection, if it was attempted.
    pub soil_data: Option<SyncResults<SoilData, PushFailureReason>>,
    /// Results for the site metadata collection, if it was attempted.
    pub site_metadata: Option<SyncResults<SiteMetadata, PushFailureReason>>,
}

impl PushUserDataResults {
    /// Returns true if no collection was attempted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.soil_data.is_none() && self.site_metadata.is_none()
    }

    /// Returns true if any attempted collection has entity-level errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.soil_data.as_ref().is_some_and(SyncResults::has_errors)
            || self
                .site_metadata
                .as_ref()
                .is_some_and(SyncResults::has_errors)
    }
}

/// Pushes the genuinely unsynced entities among the candidates in one
/// batched request.
///
/// The candidate ids are re-checked against the store's *current* ledger at
/// call time, which defends against entities having been synced by a
/// concurrent attempt between selection and execution. If nothing survives
/// the filter, the transport is not invoked at all and the result is empty.
///
/// A transport failure propagates to the caller untouched; no ledger state
/// changes for any entity in the batch. On success the response is folded
/// into per-collection `{data, errors}` maps, with each entry carrying the
/// revision id it was pushed at. Applying the results to the store is the
/// caller's responsibility; this function never mutates the ledger.
pub async fn push_user_data<T: PushTransport>(
    store: &UserDataStore,
    transport: &T,
    input: &PushInput,
) -> EngineResult<PushUserDataResults> {
    let soil = store.soil_data.unsynced_snapshot(&input.soil_data_ids);
    let metadata = store.site_metadata.unsynced_snapshot(&input.site_metadata_ids);

    if soil.is_empty() && metadata.is_empty() {
        return Ok(PushUserDataResults::default());
    }

    let request = PushRequest {
        soil_data: collection_entries(&soil),
        site_metadata: collection_entries(&metadata),
    };
    tracing::debug!(entries = request.entry_count(), "pushing unsynced user data");

    let response: PushResponse = transport.push(&request).await?;

    let mut results = PushUserDataResults::default();
    if !soil.is_empty() {
        if let Some(entries) = response.soil_data {
            results.soil_data = Some(fold_results(&soil.records, entries));
        }
    }
    if !metadata.is_empty() {
        if let Some(entries) = response.site_metadata {
            results.site_metadata = Some(fold_results(&metadata.records, entries));
        }
    }

    Ok(results)
}

/// Builds the request entries for one collection, or `None` when the
/// collection has nothing to push.
fn collection_entries<D: Clone, E>(snapshot: &UnsyncedSnapshot<D, E>) -> Option<Vec<PushEntry<D>>> {
    if snapshot.is_empty() {
        return None;
    }
    let mut entries: Vec<PushEntry<D>> = snapshot
        .data
        .iter()
        .map(|(id, data)| PushEntry {
            entity_id: id.clone(),
            data: data.clone(),
        })
        .collect();
    entries.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    Some(entries)
}

/// Partitions one collection's response entries into data and errors, keyed
/// by entity id and stamped with the revision each entity was pushed at.
fn fold_results<D: Clone>(
    records: &SyncRecords<D, PushFailureReason>,
    entries: Vec<PushResultEntry<D>>,
) -> SyncResults<D, PushFailureReason> {
    let mut results = SyncResults::default();
    for entry in entries {
        let revision_id = entity_record(records, &entry.entity_id).revision_id;
        match entry.result {
            PushResult::Success { data } => {
                results
                    .data
                    .insert(entry.entity_id, SyncedValue::new(data, revision_id));
            }
            PushResult::Failure { reason } => {
                results
                    .errors
                    .insert(entry.entity_id, SyncedValue::new(reason, revision_id));
            }
        }
    }
    results
}
