//! Per-entity sync state.

use crate::types::{next_revision_id, revision_ids_match, RevisionId, SyncTimestamp};
use serde::{Deserialize, Serialize};

/// A record of the sync state of one entity.
///
/// Sync records track an entity's modification history via an incrementing
/// revision id and modification timestamp. They can be marked synced, which
/// records the last-synced data and revision id, or marked with an error,
/// which records the revision id that was rejected while retaining the data
/// from the last successful sync.
///
/// Records start empty and gain modification/sync metadata only through the
/// transition methods. All transitions are pure: they return a new record and
/// leave the previous one untouched, which makes the commit of an update to
/// shared state a single atomic replace.
///
/// # Invariants
///
/// - [`is_unsynced`](Self::is_unsynced) iff `revision_id` is set and differs
///   from `last_synced_revision_id`
/// - [`is_error`](Self::is_error) iff `last_synced_error` is set; a
///   successful sync clears it
/// - `last_synced_revision_id` never regresses; callers apply a sync outcome
///   only while the revision it was computed against is still current
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncRecord<D, E> {
    /// Revision of the entity's current local state, incremented on every
    /// local modification. Absent if the entity was never locally modified
    /// since the last full reinitialization.
    pub revision_id: Option<RevisionId>,
    /// When the entity was last locally modified.
    pub last_modified_at: Option<SyncTimestamp>,

    /// The revision that was last pushed and resolved (acknowledged or
    /// rejected) by the remote authority.
    pub last_synced_revision_id: Option<RevisionId>,
    /// Snapshot of the entity as of the last successful sync. This is the
    /// merge baseline, not the current value.
    pub last_synced_data: Option<D>,
    /// When the last sync attempt happened, success or failure.
    pub last_synced_at: Option<SyncTimestamp>,
    /// The last sync error, cleared on success.
    pub last_synced_error: Option<E>,
}

impl<D, E> Default for SyncRecord<D, E> {
    fn default() -> Self {
        Self {
            revision_id: None,
            last_modified_at: None,
            last_synced_revision_id: None,
            last_synced_data: None,
            last_synced_at: None,
            last_synced_error: None,
        }
    }
}

impl<D, E> SyncRecord<D, E> {
    /// Creates an empty record with no modification or sync metadata.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a record for data considered already synced at load time,
    /// e.g. freshly fetched from the authority.
    #[must_use]
    pub fn initial(data: Option<D>) -> Self {
        Self {
            last_synced_data: data,
            ..Self::default()
        }
    }

    /// Returns true if the entity has a local edit the authority has not
    /// acknowledged. A record with no revision id is synced by definition.
    #[must_use]
    pub fn is_unsynced(&self) -> bool {
        !revision_ids_match(self.revision_id, self.last_synced_revision_id)
    }

    /// Returns true if the last sync attempt for this entity failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.last_synced_error.is_some()
    }
}

impl<D: Clone, E: Clone> SyncRecord<D, E> {
    /// Returns the record after one logical local edit at time `at`.
    ///
    /// Increments the revision id and stamps the modification time; all
    /// `last_synced_*` fields are preserved. Must be called exactly once per
    /// logical edit so revision numbers track edit count.
    #[must_use]
    pub fn modified(&self, at: SyncTimestamp) -> Self {
        Self {
            revision_id: Some(next_revision_id(self.revision_id)),
            last_modified_at: Some(at),
            ..self.clone()
        }
    }

    /// Returns the record after the authority acknowledged `revision_id`
    /// with `data` as the synced state.
    ///
    /// Clears any previous sync error; `revision_id`/`last_modified_at` are
    /// preserved.
    #[must_use]
    pub fn synced(&self, data: D, revision_id: Option<RevisionId>, at: SyncTimestamp) -> Self {
        Self {
            last_synced_revision_id: revision_id,
            last_synced_data: Some(data),
            last_synced_error: None,
            last_synced_at: Some(at),
            ..self.clone()
        }
    }

    /// Returns the record after the authority rejected `revision_id` with
    /// `error`.
    ///
    /// The rejected revision still advances `last_synced_revision_id`: the
    /// push is resolved for that revision, and a later local edit is required
    /// to produce a fresh revision to push.
    #[must_use]
    pub fn errored(&self, error: E, revision_id: Option<RevisionId>, at: SyncTimestamp) -> Self {
        Self {
            last_synced_revision_id: revision_id,
            last_synced_error: Some(error),
            last_synced_at: Some(at),
            ..self.clone()
        }
    }
}
