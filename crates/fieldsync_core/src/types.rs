//! Core type definitions for the sync ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Revision counter for an entity's local edit history.
///
/// Revision ids are monotonically increasing and track "how many times this
/// entity has been locally modified since the last full reinitialization",
/// not wall-clock time. An entity with no revision id has never been locally
/// modified.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct RevisionId(pub u64);

impl RevisionId {
    /// The revision counter's starting point, before any modification.
    pub const INITIAL: RevisionId = RevisionId(0);

    /// Creates a new revision id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next revision id.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rev:{}", self.0)
    }
}

/// Returns the revision id that follows `prev`, starting from
/// [`RevisionId::INITIAL`] when the entity has never been modified.
#[must_use]
pub fn next_revision_id(prev: Option<RevisionId>) -> RevisionId {
    prev.unwrap_or(RevisionId::INITIAL).next()
}

/// Compares an entity's current revision id against a sync-side revision id.
///
/// An entity with no current revision id matches anything: nothing was ever
/// pushed for it, so there is nothing to be out of date with. Otherwise the
/// two ids must be present and equal.
#[must_use]
pub fn revision_ids_match(current: Option<RevisionId>, other: Option<RevisionId>) -> bool {
    match current {
        None => true,
        Some(current) => other == Some(current),
    }
}

/// Wall-clock timestamp in milliseconds since the Unix epoch.
///
/// Used for `last_modified_at`/`last_synced_at` stamping. Not required to be
/// strictly monotonic across process restarts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SyncTimestamp(pub i64);

impl SyncTimestamp {
    /// Creates a timestamp from epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the raw epoch-millisecond value.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SyncTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t:{}ms", self.0)
    }
}

/// Stable identifier for a domain entity (e.g. a site).
///
/// Entity ids are opaque strings assigned by the remote authority.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    /// Creates an entity id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_id_next() {
        let r1 = RevisionId::new(5);
        assert_eq!(r1.next().as_u64(), 6);
    }

    #[test]
    fn next_revision_id_starts_at_one() {
        assert_eq!(next_revision_id(None), RevisionId::new(1));
        assert_eq!(next_revision_id(Some(RevisionId::new(3))), RevisionId::new(4));
    }

    #[test]
    fn revision_ids_match_no_current() {
        // An entity that was never modified matches any sync-side revision.
        assert!(revision_ids_match(None, None));
        assert!(revision_ids_match(None, Some(RevisionId::new(1))));
    }

    #[test]
    fn revision_ids_match_current() {
        let r = Some(RevisionId::new(2));
        assert!(revision_ids_match(r, Some(RevisionId::new(2))));
        assert!(!revision_ids_match(r, Some(RevisionId::new(1))));
        assert!(!revision_ids_match(r, None));
    }

    #[test]
    fn entity_id_display() {
        let id = EntityId::from("site-1");
        assert_eq!(format!("{id}"), "site-1");
        assert_eq!(id.as_str(), "site-1");
    }
}
