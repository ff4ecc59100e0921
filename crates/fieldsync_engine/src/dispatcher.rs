//! Automated dispatch of push attempts.
//!
//! The dispatcher observes login state, connectivity, and the unsynced id
//! sets (each debounced), and pushes whenever all three permit it: logged
//! in, online, and something unsynced. A failed attempt starts a
//! fixed-interval retry loop; any observed input change wins over an
//! in-flight retry cycle and resets it.

use crate::config::EngineConfig;
use crate::notify::NotificationSink;
use crate::push::{push_user_data, PushInput};
use crate::signals::{SignalHub, SyncSignals};
use crate::store::UserDataStore;
use crate::transport::PushTransport;
use fieldsync_core::Clock;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// The dispatcher's externally visible state: whether a retry loop is
/// currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// No retry cycle is active.
    Idle,
    /// A prior attempt failed; the retry timer is re-attempting at a fixed
    /// cadence.
    Retrying,
}

/// Classification of one push attempt's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The transport call succeeded and no entity was rejected. Includes
    /// attempts that found nothing to push.
    Clean,
    /// The transport call succeeded but some entities were rejected.
    EntityErrors,
    /// The transport call itself failed; no ledger state changed.
    TransportFailed,
}

impl AttemptOutcome {
    /// Returns true if the outcome should start or continue a retry cycle.
    ///
    /// Entity rejections and transport failures are treated alike: the
    /// engine cannot distinguish a permanent rejection from a transient
    /// one, so retry is the recovery mechanism for both.
    #[must_use]
    pub fn needs_retry(self) -> bool {
        matches!(self, Self::EntityErrors | Self::TransportFailed)
    }
}

/// Drives push attempts from the observable inputs.
///
/// One logical flow of control: attempts are awaited one at a time, so a
/// slow transport call delays further scheduling instead of piling up
/// concurrent attempts. The retry cadence is constant; there is no backoff.
pub struct PushDispatcher<T, N> {
    config: EngineConfig,
    store: Arc<UserDataStore>,
    transport: Arc<T>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    hub: Arc<SignalHub>,
    signals: SyncSignals,
    mode: watch::Sender<DispatchMode>,
}

impl<T: PushTransport, N: NotificationSink> PushDispatcher<T, N> {
    /// Creates a dispatcher observing `hub` and operating on `store`.
    pub fn new(
        config: EngineConfig,
        store: Arc<UserDataStore>,
        transport: Arc<T>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
        hub: Arc<SignalHub>,
    ) -> Self {
        let signals = hub.subscribe();
        Self {
            config,
            store,
            transport,
            notifier,
            clock,
            hub,
            signals,
            mode: watch::channel(DispatchMode::Idle).0,
        }
    }

    /// Returns the current mode.
    #[must_use]
    pub fn mode(&self) -> DispatchMode {
        *self.mode.borrow()
    }

    /// Returns a receiver observing mode changes, e.g. for a sync
    /// indicator.
    #[must_use]
    pub fn subscribe_mode(&self) -> watch::Receiver<DispatchMode> {
        self.mode.subscribe()
    }

    /// Runs the dispatch loop until every signal sender is dropped.
    ///
    /// Debounces the observed signals by the configured interval, issues a
    /// push attempt whenever a debounced input change leaves the gating
    /// condition satisfied, and re-attempts on the retry interval after a
    /// failure.
    pub async fn run(mut self) {
        self.signals = self.signals.debounced(self.config.debounce_interval);
        let mut offline = self.signals.offline.clone();
        let mut logged_in = self.signals.logged_in.clone();
        let mut soil_ids = self.signals.unsynced_soil_data.clone();
        let mut metadata_ids = self.signals.unsynced_site_metadata.clone();

        let mut retry = tokio::time::interval(self.config.retry_interval);
        retry.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Conditions may already hold when the dispatcher starts.
        self.handle_input_change(&mut retry).await;

        loop {
            let input_changed = tokio::select! {
                changed = offline.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    true
                }
                changed = logged_in.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    true
                }
                changed = soil_ids.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    true
                }
                changed = metadata_ids.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    true
                }
                _ = retry.tick(), if self.mode() == DispatchMode::Retrying => false,
            };

            if input_changed {
                self.handle_input_change(&mut retry).await;
            } else {
                self.handle_retry_tick().await;
            }
        }
    }

    /// Runs a single push attempt against the current unsynced id sets,
    /// applies its results to the store, and surfaces errors.
    ///
    /// This is what both the input-change path and the retry timer invoke;
    /// it can also be called directly for a manually triggered sync.
    pub async fn attempt(&self) -> AttemptOutcome {
        let input = PushInput {
            soil_data_ids: self.signals.unsynced_soil_data.borrow().clone(),
            site_metadata_ids: self.signals.unsynced_site_metadata.borrow().clone(),
        };

        match push_user_data(self.store.as_ref(), self.transport.as_ref(), &input).await {
            Ok(results) => {
                self.store.apply_push_results(&results, self.clock.now());
                self.hub.refresh_from_store(&self.store);
                if results.has_errors() {
                    warn!("push attempt left entities in error");
                    // One notification per attempt, however many entities
                    // were rejected.
                    self.notifier.show_error();
                    AttemptOutcome::EntityErrors
                } else {
                    AttemptOutcome::Clean
                }
            }
            Err(error) => {
                warn!(%error, "push attempt failed in transport");
                AttemptOutcome::TransportFailed
            }
        }
    }

    /// Returns true when a push is permitted: logged in, online, and some
    /// collection has unsynced entities.
    fn gating_met(&self) -> bool {
        *self.signals.logged_in.borrow()
            && !*self.signals.offline.borrow()
            && (!self.signals.unsynced_soil_data.borrow().is_empty()
                || !self.signals.unsynced_site_metadata.borrow().is_empty())
    }

    async fn handle_input_change(&self, retry: &mut tokio::time::Interval) {
        // An observed input change always wins over an in-flight retry
        // cycle; this is a hard reset, not a backoff adjustment.
        if self.mode() == DispatchMode::Retrying {
            debug!("input change resets retry cycle");
        }
        self.set_mode(DispatchMode::Idle);

        if !self.gating_met() {
            return;
        }

        let outcome = self.attempt().await;
        if outcome.needs_retry() {
            retry.reset();
            self.set_mode(DispatchMode::Retrying);
        }
    }

    async fn handle_retry_tick(&self) {
        debug!("retry interval re-attempting push");
        let outcome = self.attempt().await;
        if !outcome.needs_retry() {
            self.set_mode(DispatchMode::Idle);
        }
    }

    fn set_mode(&self, mode: DispatchMode) {
        self.mode.send_replace(mode);
    }
}
