//! Transport abstraction for the remote push collaborator.

use crate::error::{EngineError, EngineResult};
use fieldsync_protocol::{PushRequest, PushResponse};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;

/// The remote authority's push endpoint.
///
/// This trait abstracts the network layer, allowing different
/// implementations (HTTP, GraphQL, mock for testing). The call is the only
/// suspension point in a push attempt; it may fail wholesale, in which case
/// no entity in the batch is presumed synced or errored.
pub trait PushTransport: Send + Sync {
    /// Pushes a batch of entity mutations and returns the authority's
    /// per-entity results.
    fn push(
        &self,
        request: &PushRequest,
    ) -> impl Future<Output = EngineResult<PushResponse>> + Send;
}

/// A mock transport for testing.
///
/// Serves scripted responses in order and records every request it
/// receives. With no scripted response queued, `push` fails with a protocol
/// error.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<EngineResult<PushResponse>>>,
    requests: Mutex<Vec<PushRequest>>,
}

impl MockTransport {
    /// Creates a new mock transport with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    pub fn enqueue_response(&self, response: PushResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queues a transport failure.
    pub fn enqueue_failure(&self, error: EngineError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Returns the number of push calls made so far.
    #[must_use]
    pub fn push_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns all requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<PushRequest> {
        self.requests.lock().clone()
    }

    /// Returns the most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<PushRequest> {
        self.requests.lock().last().cloned()
    }
}

impl PushTransport for MockTransport {
    async fn push(&self, request: &PushRequest) -> EngineResult<PushResponse> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::Protocol("no mock push response queued".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_serves_scripted_responses_in_order() {
        let transport = MockTransport::new();
        transport.enqueue_response(PushResponse::empty());
        transport.enqueue_failure(EngineError::transport_retryable("offline"));

        let request = PushRequest::default();
        assert_eq!(transport.push(&request).await, Ok(PushResponse::empty()));
        assert!(transport.push(&request).await.is_err());
        assert_eq!(transport.push_count(), 2);
    }

    #[tokio::test]
    async fn mock_fails_without_script() {
        let transport = MockTransport::new();
        let result = transport.push(&PushRequest::default()).await;
        assert!(matches!(result, Err(EngineError::Protocol(_))));
    }

    #[tokio::test]
    async fn mock_records_requests() {
        let transport = MockTransport::new();
        transport.enqueue_response(PushResponse::empty());

        let request = PushRequest::default();
        transport.push(&request).await.unwrap();
        assert_eq!(transport.last_request(), Some(request));
    }
}
