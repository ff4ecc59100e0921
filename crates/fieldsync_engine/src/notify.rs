//! Notification sink for surfacing sync errors to the user.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Fire-and-forget sink for "a sync error occurred" notifications.
///
/// The dispatcher calls this at most once per push attempt, regardless of
/// how many entities were rejected in that attempt.
pub trait NotificationSink: Send + Sync {
    /// Surfaces a sync error to the user.
    fn show_error(&self);
}

/// A notification sink that counts calls, for testing.
#[derive(Debug, Default)]
pub struct MockNotifications {
    errors: AtomicUsize,
}

impl MockNotifications {
    /// Creates a new counting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many error notifications were shown.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

impl NotificationSink for MockNotifications {
    fn show_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_notifications() {
        let sink = MockNotifications::new();
        assert_eq!(sink.error_count(), 0);
        sink.show_error();
        sink.show_error();
        assert_eq!(sink.error_count(), 2);
    }
}
