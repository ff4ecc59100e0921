//! Batched push request and response messages.

use crate::entities::{SiteMetadata, SoilData};
use fieldsync_core::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entity mutation in a push request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEntry<D> {
    /// The entity being pushed.
    pub entity_id: EntityId,
    /// The entity's current local state.
    pub data: D,
}

impl<D> PushEntry<D> {
    /// Creates a push entry.
    pub fn new(entity_id: impl Into<EntityId>, data: D) -> Self {
        Self {
            entity_id: entity_id.into(),
            data,
        }
    }
}

/// The authority's verdict on one pushed entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PushResult<D> {
    /// The mutation was accepted; `data` is the authoritative state.
    Success {
        /// The entity as stored by the authority.
        data: D,
    },
    /// The mutation was refused.
    Failure {
        /// Why the authority refused it.
        reason: PushFailureReason,
    },
}

impl<D> PushResult<D> {
    /// Creates a success result.
    pub fn success(data: D) -> Self {
        Self::Success { data }
    }

    /// Creates a failure result.
    pub fn failure(reason: PushFailureReason) -> Self {
        Self::Failure { reason }
    }

    /// Returns true for a success result.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One entity's outcome in a push response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResultEntry<D> {
    /// The entity the result is for.
    pub entity_id: EntityId,
    /// The authority's verdict.
    pub result: PushResult<D>,
}

impl<D> PushResultEntry<D> {
    /// Creates a result entry.
    pub fn new(entity_id: impl Into<EntityId>, result: PushResult<D>) -> Self {
        Self {
            entity_id: entity_id.into(),
            result,
        }
    }
}

/// Why the authority refused one entity's mutation.
///
/// Entity-level rejections only; transport failures are not expressed in
/// the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushFailureReason {
    /// The entity no longer exists on the authority.
    DoesNotExist,
    /// The user is not allowed to mutate this entity.
    NotAllowed,
    /// The mutation did not validate.
    InvalidData,
}

impl fmt::Display for PushFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DoesNotExist => "DOES_NOT_EXIST",
            Self::NotAllowed => "NOT_ALLOWED",
            Self::InvalidData => "INVALID_DATA",
        };
        f.write_str(name)
    }
}

/// A batched push of unsynced entities across collections.
///
/// A collection set to `None` was not part of this attempt; `Some(vec![])`
/// would mean "requested with zero entries" and is never produced by the
/// engine, which skips empty collections entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Soil data mutations, or `None` if the collection is not in the batch.
    pub soil_data: Option<Vec<PushEntry<SoilData>>>,
    /// Site metadata mutations, or `None` if the collection is not in the
    /// batch.
    pub site_metadata: Option<Vec<PushEntry<SiteMetadata>>>,
}

impl PushRequest {
    /// Returns true if no collection carries any entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.soil_data.as_ref().is_none_or(Vec::is_empty)
            && self.site_metadata.as_ref().is_none_or(Vec::is_empty)
    }

    /// Returns the total number of entries across collections.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.soil_data.as_ref().map_or(0, Vec::len)
            + self.site_metadata.as_ref().map_or(0, Vec::len)
    }
}

/// The authority's per-entity results for a push request, parallel to the
/// request's collections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    /// Results for the soil data collection, or `None` if it was not
    /// requested.
    pub soil_data: Option<Vec<PushResultEntry<SoilData>>>,
    /// Results for the site metadata collection, or `None` if it was not
    /// requested.
    pub site_metadata: Option<Vec<PushResultEntry<SiteMetadata>>>,
}

impl PushResponse {
    /// Creates a response with no collection results.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if any entity in the response was refused.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        let soil = self
            .soil_data
            .as_ref()
            .is_some_and(|entries| entries.iter().any(|e| !e.result.is_success()));
        let metadata = self
            .site_metadata
            .as_ref()
            .is_some_and(|entries| entries.iter().any(|e| !e.result.is_success()));
        soil || metadata
    }
}
