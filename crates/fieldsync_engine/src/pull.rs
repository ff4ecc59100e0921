//! Automated requests for authoritative data refreshes.
//!
//! The pull requester does not fetch anything itself: it emits pull
//! requests the surrounding application consumes by fetching the
//! authoritative data set and merging it into the stores. Requests are
//! emitted on startup, when connectivity returns, when a push attempt
//! leaves entities in error, and at a fixed interval.

use crate::config::EngineConfig;
use crate::signals::{debounce, SyncSignals};
use fieldsync_core::EntityId;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Why a pull was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullReason {
    /// The requester just started; load the initial data set.
    Startup,
    /// The device came back online.
    BackOnline,
    /// A push attempt left entities in error; a refresh may resolve them.
    PushErrors,
    /// The periodic refresh interval elapsed.
    Interval,
}

/// Emits pull requests from connectivity, sync-error, and timer triggers.
pub struct PullRequester {
    config: EngineConfig,
    offline: watch::Receiver<bool>,
    sync_errors: watch::Receiver<Vec<EntityId>>,
    requests: mpsc::UnboundedSender<PullReason>,
}

impl PullRequester {
    /// Creates a requester observing `signals`, returning it together with
    /// the request stream to consume.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        signals: &SyncSignals,
    ) -> (Self, mpsc::UnboundedReceiver<PullReason>) {
        let (requests, receiver) = mpsc::unbounded_channel();
        (
            Self {
                config,
                offline: signals.offline.clone(),
                sync_errors: signals.sync_errors.clone(),
                requests,
            },
            receiver,
        )
    }

    /// Runs the requester until the request receiver or every signal
    /// sender is dropped.
    pub async fn run(self) {
        let mut offline = debounce(self.offline.clone(), self.config.debounce_interval);
        let mut sync_errors = self.sync_errors.clone();
        let mut was_offline = *offline.borrow();

        if self.send(PullReason::Startup).is_err() {
            return;
        }

        let period = self.config.pull_interval;
        let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let reason = tokio::select! {
                changed = offline.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let now_offline = *offline.borrow_and_update();
                    let came_back = was_offline && !now_offline;
                    was_offline = now_offline;
                    came_back.then_some(PullReason::BackOnline)
                }
                changed = sync_errors.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let has_errors = !sync_errors.borrow_and_update().is_empty();
                    has_errors.then_some(PullReason::PushErrors)
                }
                _ = ticks.tick() => Some(PullReason::Interval),
            };

            if let Some(reason) = reason {
                if self.send(reason).is_err() {
                    break;
                }
            }
        }
    }

    fn send(&self, reason: PullReason) -> Result<(), mpsc::error::SendError<PullReason>> {
        debug!(?reason, "requesting pull");
        self.requests.send(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalHub;
    use std::time::Duration;

    fn test_config() -> EngineConfig {
        EngineConfig::new()
            .with_debounce_interval(Duration::from_millis(50))
            .with_pull_interval(Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn requests_pull_on_startup() {
        let hub = SignalHub::new();
        let (requester, mut requests) = PullRequester::new(test_config(), &hub.subscribe());
        tokio::spawn(requester.run());

        assert_eq!(requests.recv().await, Some(PullReason::Startup));
    }

    #[tokio::test(start_paused = true)]
    async fn requests_pull_when_back_online() {
        let hub = SignalHub::new();
        let (requester, mut requests) = PullRequester::new(test_config(), &hub.subscribe());
        tokio::spawn(requester.run());
        assert_eq!(requests.recv().await, Some(PullReason::Startup));

        hub.set_offline(false);
        assert_eq!(requests.recv().await, Some(PullReason::BackOnline));

        // Going offline again does not request a pull.
        hub.set_offline(true);
        let next = tokio::time::timeout(Duration::from_secs(1), requests.recv()).await;
        assert!(next.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn requests_pull_when_push_errors_appear() {
        let hub = SignalHub::new();
        let (requester, mut requests) = PullRequester::new(test_config(), &hub.subscribe());
        tokio::spawn(requester.run());
        assert_eq!(requests.recv().await, Some(PullReason::Startup));

        hub.set_sync_errors(vec![fieldsync_core::EntityId::from("site-1")]);
        assert_eq!(requests.recv().await, Some(PullReason::PushErrors));

        // Errors clearing is not a pull trigger.
        hub.set_sync_errors(Vec::new());
        let next = tokio::time::timeout(Duration::from_secs(1), requests.recv()).await;
        assert!(next.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn requests_pull_at_fixed_interval() {
        let hub = SignalHub::new();
        let (requester, mut requests) = PullRequester::new(test_config(), &hub.subscribe());
        tokio::spawn(requester.run());
        assert_eq!(requests.recv().await, Some(PullReason::Startup));

        assert_eq!(requests.recv().await, Some(PullReason::Interval));
        assert_eq!(requests.recv().await, Some(PullReason::Interval));
    }
}
