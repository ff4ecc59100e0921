//! Combined store for all synced user-data collections.

use crate::push::PushUserDataResults;
use fieldsync_core::{EntityId, SyncStore, SyncTimestamp};
use fieldsync_protocol::{PushFailureReason, SiteMetadata, SoilData};

/// The user's locally held field data: one [`SyncStore`] per entity
/// collection.
///
/// The store is shared between the application (which applies local edits)
/// and the push machinery (which reads unsynced snapshots and applies sync
/// results); it is injected rather than held in ambient state.
#[derive(Default)]
pub struct UserDataStore {
    /// Soil observations, keyed by site id.
    pub soil_data: SyncStore<SoilData, PushFailureReason>,
    /// Site metadata, keyed by site id.
    pub site_metadata: SyncStore<SiteMetadata, PushFailureReason>,
}

impl UserDataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the site ids with unsynced data in any collection, sorted
    /// and deduplicated.
    pub fn unsynced_site_ids(&self) -> Vec<EntityId> {
        let mut ids = self.soil_data.unsynced_ids();
        ids.extend(self.site_metadata.unsynced_ids());
        ids.sort();
        ids.dedup();
        ids
    }

    /// Returns the site ids with a sync error in any collection, sorted and
    /// deduplicated.
    pub fn sync_error_site_ids(&self) -> Vec<EntityId> {
        let mut ids = self.soil_data.error_ids();
        ids.extend(self.site_metadata.error_ids());
        ids.sort();
        ids.dedup();
        ids
    }

    /// Applies one push attempt's results to the affected collections.
    ///
    /// Collections the attempt did not touch are left alone; stale entries
    /// are discarded per collection by the ledger's staleness guard.
    pub fn apply_push_results(&self, results: &PushUserDataResults, at: SyncTimestamp) {
        if let Some(soil_results) = &results.soil_data {
            self.soil_data.apply_results(soil_results, at);
        }
        if let Some(metadata_results) = &results.site_metadata {
            self.site_metadata.apply_results(metadata_results, at);
        }
    }
}
