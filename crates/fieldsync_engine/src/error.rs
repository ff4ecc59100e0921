//! Error types for the push engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while orchestrating a push.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The remote call itself failed (network error, server error).
    ///
    /// No ledger mutation happens for any entity in the batch; the batch is
    /// retried wholesale on the next cycle.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The response did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl EngineError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Transport { retryable, .. } => *retryable,
            EngineError::Protocol(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(EngineError::transport_retryable("connection lost").is_retryable());
        assert!(!EngineError::transport_fatal("invalid certificate").is_retryable());
        assert!(!EngineError::Protocol("bad response".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = EngineError::transport_retryable("connection reset");
        assert_eq!(err.to_string(), "transport error: connection reset");
    }
}
