//! Observable inputs for the dispatcher and pull requester.
//!
//! The surrounding application publishes connectivity, login state, and the
//! per-collection unsynced id sets into a [`SignalHub`]; the engine
//! components observe them through [`SyncSignals`], usually debounced.

use crate::store::UserDataStore;
use fieldsync_core::EntityId;
use std::time::Duration;
use tokio::sync::watch;

/// Publishes a new value only when it differs from the current one, so
/// value-equal updates do not wake observers.
fn publish<T: PartialEq>(tx: &watch::Sender<T>, value: T) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

/// Forwards `input` to a new channel, publishing a changed value only after
/// it has stayed unchanged for `interval`.
///
/// The returned receiver starts at the input's current value. A value that
/// flaps within the window is observed only in its settled state. Spawns a
/// task; must be called within a tokio runtime.
pub fn debounce<T>(mut input: watch::Receiver<T>, interval: Duration) -> watch::Receiver<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let (tx, rx) = watch::channel(input.borrow().clone());
    tokio::spawn(async move {
        loop {
            if input.changed().await.is_err() {
                break;
            }
            // A change arrived; hold off until the window stays quiet.
            loop {
                let settled = input.borrow_and_update().clone();
                tokio::select! {
                    changed = input.changed() => {
                        if changed.is_err() {
                            publish(&tx, settled);
                            return;
                        }
                    }
                    () = tokio::time::sleep(interval) => {
                        publish(&tx, settled);
                        break;
                    }
                }
            }
        }
    });
    rx
}

/// Sender side of the engine's observable inputs.
///
/// Owned by the surrounding application, which pushes connectivity and
/// session changes into it and refreshes the id sets after store mutations.
#[derive(Debug)]
pub struct SignalHub {
    offline: watch::Sender<bool>,
    logged_in: watch::Sender<bool>,
    unsynced_soil_data: watch::Sender<Vec<EntityId>>,
    unsynced_site_metadata: watch::Sender<Vec<EntityId>>,
    sync_errors: watch::Sender<Vec<EntityId>>,
}

impl SignalHub {
    /// Creates a hub with the initial state: offline, logged out, nothing
    /// unsynced.
    #[must_use]
    pub fn new() -> Self {
        Self {
            offline: watch::channel(true).0,
            logged_in: watch::channel(false).0,
            unsynced_soil_data: watch::channel(Vec::new()).0,
            unsynced_site_metadata: watch::channel(Vec::new()).0,
            sync_errors: watch::channel(Vec::new()).0,
        }
    }

    /// Publishes the connectivity state.
    pub fn set_offline(&self, offline: bool) {
        publish(&self.offline, offline);
    }

    /// Publishes the login state.
    pub fn set_logged_in(&self, logged_in: bool) {
        publish(&self.logged_in, logged_in);
    }

    /// Publishes the unsynced soil data site ids.
    pub fn set_unsynced_soil_data(&self, ids: Vec<EntityId>) {
        publish(&self.unsynced_soil_data, ids);
    }

    /// Publishes the unsynced site metadata site ids.
    pub fn set_unsynced_site_metadata(&self, ids: Vec<EntityId>) {
        publish(&self.unsynced_site_metadata, ids);
    }

    /// Publishes the site ids with sync errors.
    pub fn set_sync_errors(&self, ids: Vec<EntityId>) {
        publish(&self.sync_errors, ids);
    }

    /// Recomputes the id signals from the store's current ledgers.
    ///
    /// Call after any store mutation (local edit, applied sync results,
    /// merge); value-equal refreshes are absorbed.
    pub fn refresh_from_store(&self, store: &UserDataStore) {
        self.set_unsynced_soil_data(store.soil_data.unsynced_ids());
        self.set_unsynced_site_metadata(store.site_metadata.unsynced_ids());
        self.set_sync_errors(store.sync_error_site_ids());
    }

    /// Creates a receiver bundle observing this hub.
    #[must_use]
    pub fn subscribe(&self) -> SyncSignals {
        SyncSignals {
            offline: self.offline.subscribe(),
            logged_in: self.logged_in.subscribe(),
            unsynced_soil_data: self.unsynced_soil_data.subscribe(),
            unsynced_site_metadata: self.unsynced_site_metadata.subscribe(),
            sync_errors: self.sync_errors.subscribe(),
        }
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side of the engine's observable inputs.
#[derive(Debug, Clone)]
pub struct SyncSignals {
    /// Whether the device is offline.
    pub offline: watch::Receiver<bool>,
    /// Whether a user session is active.
    pub logged_in: watch::Receiver<bool>,
    /// Site ids with unsynced soil data.
    pub unsynced_soil_data: watch::Receiver<Vec<EntityId>>,
    /// Site ids with unsynced site metadata.
    pub unsynced_site_metadata: watch::Receiver<Vec<EntityId>>,
    /// Site ids whose last sync attempt failed.
    pub sync_errors: watch::Receiver<Vec<EntityId>>,
}

impl SyncSignals {
    /// Returns this bundle with every signal debounced by `interval`.
    ///
    /// Spawns one forwarding task per signal; must be called within a tokio
    /// runtime.
    #[must_use]
    pub fn debounced(&self, interval: Duration) -> SyncSignals {
        SyncSignals {
            offline: debounce(self.offline.clone(), interval),
            logged_in: debounce(self.logged_in.clone(), interval),
            unsynced_soil_data: debounce(self.unsynced_soil_data.clone(), interval),
            unsynced_site_metadata: debounce(self.unsynced_site_metadata.clone(), interval),
            sync_errors: debounce(self.sync_errors.clone(), interval),
        }
    }
}
