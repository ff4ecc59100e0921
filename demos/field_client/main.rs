//! Fieldsync demo - a simulated field data collection session.
//!
//! This example demonstrates the full sync flow:
//! - Recording soil observations while offline
//! - The dispatcher holding pushes back until connectivity and login allow
//! - A batched push with a partial per-entity rejection
//! - Recovery after the user edits the rejected entity
//!
//! Run with: cargo run -p field_client

use fieldsync_core::{Clock, EntityId, SystemClock};
use fieldsync_engine::{
    EngineConfig, EngineError, EngineResult, NotificationSink, PullRequester, PushDispatcher,
    PushTransport, SignalHub, UserDataStore,
};
use fieldsync_protocol::{
    DepthInterval, PushEntry, PushFailureReason, PushRequest, PushResponse, PushResult,
    PushResultEntry, SoilData,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A toy authority: accepts everything except the sites it was told to
/// refuse, and remembers what it stored.
#[derive(Default)]
struct DemoAuthority {
    soil_data: Mutex<HashMap<EntityId, SoilData>>,
    refused: Mutex<HashSet<EntityId>>,
}

impl DemoAuthority {
    fn refuse(&self, id: &str) {
        self.refused.lock().insert(EntityId::from(id));
    }

    fn allow(&self, id: &str) {
        self.refused.lock().remove(&EntityId::from(id));
    }

    fn stored_count(&self) -> usize {
        self.soil_data.lock().len()
    }
}

impl PushTransport for DemoAuthority {
    async fn push(&self, request: &PushRequest) -> EngineResult<PushResponse> {
        let entries = request
            .soil_data
            .clone()
            .ok_or_else(|| EngineError::Protocol("demo authority only stores soil data".into()))?;

        let results = entries
            .into_iter()
            .map(|entry: PushEntry<SoilData>| {
                let result = if self.refused.lock().contains(&entry.entity_id) {
                    PushResult::failure(PushFailureReason::NotAllowed)
                } else {
                    self.soil_data
                        .lock()
                        .insert(entry.entity_id.clone(), entry.data.clone());
                    PushResult::success(entry.data)
                };
                PushResultEntry {
                    entity_id: entry.entity_id,
                    result,
                }
            })
            .collect();

        Ok(PushResponse {
            soil_data: Some(results),
            site_metadata: None,
        })
    }
}

/// Surfaces sync errors on the console, standing in for a toast.
#[derive(Default)]
struct ConsoleNotifications {
    shown: Mutex<usize>,
}

impl ConsoleNotifications {
    fn shown(&self) -> usize {
        *self.shown.lock()
    }
}

impl NotificationSink for ConsoleNotifications {
    fn show_error(&self) {
        *self.shown.lock() += 1;
        tracing::warn!("some changes could not be synced");
    }
}

fn record_observation(store: &UserDataStore, hub: &SignalHub, id: &str, notes: &str) {
    let clock = SystemClock;
    store.soil_data.modify(&EntityId::from(id), clock.now(), |_| SoilData {
        slope_steepness: Some(8),
        notes: Some(notes.to_string()),
        depth_intervals: vec![DepthInterval {
            start_cm: 0,
            end_cm: 20,
            texture: Some("CLAY_LOAM".into()),
        }],
    });
    hub.refresh_from_store(store);
    info!(site = id, "recorded observation");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(UserDataStore::new());
    let authority = Arc::new(DemoAuthority::default());
    let notifier = Arc::new(ConsoleNotifications::default());
    let hub = Arc::new(SignalHub::new());

    let config = EngineConfig::new()
        .with_debounce_interval(Duration::from_millis(50))
        .with_retry_interval(Duration::from_secs(2))
        .with_pull_interval(Duration::from_secs(30));

    let dispatcher = PushDispatcher::new(
        config.clone(),
        Arc::clone(&store),
        Arc::clone(&authority),
        Arc::clone(&notifier),
        Arc::new(SystemClock),
        Arc::clone(&hub),
    );
    let mut mode = dispatcher.subscribe_mode();
    tokio::spawn(dispatcher.run());

    let (requester, mut pulls) = PullRequester::new(config, &hub.subscribe());
    tokio::spawn(requester.run());
    tokio::spawn(async move {
        while let Some(reason) = pulls.recv().await {
            info!(?reason, "pull requested (a real client would fetch and merge here)");
        }
    });

    info!("session starts offline and logged in");
    hub.set_logged_in(true);
    hub.set_offline(true);

    record_observation(&store, &hub, "site-1", "dark clay, poorly drained");
    record_observation(&store, &hub, "site-2", "sandy loam on a terrace");
    tokio::time::sleep(Duration::from_millis(500)).await;
    info!(
        unsynced = store.unsynced_site_ids().len(),
        stored = authority.stored_count(),
        "still offline, nothing pushed"
    );

    info!("site-2 will be refused by the authority (no permission)");
    authority.refuse("site-2");

    info!("connectivity returns");
    hub.set_offline(false);
    tokio::time::sleep(Duration::from_secs(1)).await;
    info!(
        stored = authority.stored_count(),
        errors = store.sync_error_site_ids().len(),
        notifications = notifier.shown(),
        mode = ?*mode.borrow_and_update(),
        "after first push: site-1 synced, site-2 rejected"
    );

    info!("permission granted; the user edits site-2 again");
    authority.allow("site-2");
    record_observation(&store, &hub, "site-2", "sandy loam, rechecked");
    tokio::time::sleep(Duration::from_secs(1)).await;
    info!(
        stored = authority.stored_count(),
        unsynced = store.unsynced_site_ids().len(),
        errors = store.sync_error_site_ids().len(),
        "after recovery: everything synced"
    );
}
