//! # Fieldsync Engine
//!
//! Push orchestration for offline-first field data.
//!
//! This crate provides:
//! - The push action: select unsynced entities, batch them into one remote
//!   request, and partition the response into per-entity outcomes
//! - The push dispatcher: a debounce/gate/retry state machine driving the
//!   push action from connectivity, login, and unsynced-data signals
//! - The pull requester: triggers for refreshing the authoritative data set
//! - The transport and notification-sink traits at the engine's boundary
//!
//! ## Key Invariants
//!
//! - Pushing with nothing unsynced is a no-op, not an empty network call
//! - A transport failure marks nothing; the batch retries wholesale
//! - Entity rejections are isolated: one entity's failure never blocks the
//!   others in the batch
//! - An input change always wins over an in-flight retry cycle
//! - A user's most recent edit is never silently dropped

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dispatcher;
mod error;
mod notify;
mod pull;
mod push;
mod signals;
mod store;
mod transport;

pub use config::EngineConfig;
pub use dispatcher::{AttemptOutcome, DispatchMode, PushDispatcher};
pub use error::{EngineError, EngineResult};
pub use notify::{MockNotifications, NotificationSink};
pub use pull::{PullReason, PullRequester};
pub use push::{push_user_data, PushInput, PushUserDataResults};
pub use signals::{debounce, SignalHub, SyncSignals};
pub use store::UserDataStore;
pub use transport::{MockTransport, PushTransport};
