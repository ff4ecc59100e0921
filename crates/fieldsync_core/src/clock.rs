//! Time source abstraction.

use crate::types::SyncTimestamp;
use std::time::{SystemTime, UNIX_EPOCH};

/// A wall-clock time source for `last_modified_at`/`last_synced_at` stamping.
///
/// Injected rather than read ambiently so tests can use fixed timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SyncTimestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SyncTimestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        SyncTimestamp::from_millis(millis as i64)
    }
}
