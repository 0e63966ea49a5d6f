//! Client wrapper: perform a request, and defer it when the server was
//! unreachable and the policy allows it.
//!
//! The caller always gets the original error back; deferral is a side effect
//! it does not wait on.

use crate::classify::{self, RequestError};
use crate::method::Method;
use crate::queue::MutationQueue;
use crate::transport::{HttpTransport, Response};

#[derive(Debug, Clone)]
pub struct Client {
    transport: HttpTransport,
    queue: MutationQueue,
}

impl Client {
    pub fn new(transport: HttpTransport, queue: MutationQueue) -> Self {
        Self { transport, queue }
    }

    pub fn queue(&self) -> &MutationQueue {
        &self.queue
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&str>,
    ) -> Result<Response, RequestError> {
        match self.transport.send(method, endpoint, body).await {
            Ok(response) => Ok(response),
            Err(err) => {
                self.defer_if_eligible(method, endpoint, body, &err);
                Err(err)
            }
        }
    }

    /// Returns whether the failed request was queued.
    fn defer_if_eligible(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&str>,
        err: &RequestError,
    ) -> bool {
        let kind = classify::classify(err);
        if kind != classify::FailureKind::Connectivity {
            tracing::debug!(%method, endpoint, ?kind, "request failed; not a connectivity failure");
            return false;
        }
        if !self.queue.should_queue(method, endpoint) {
            tracing::debug!(%method, endpoint, "server unreachable; request not eligible for deferral");
            return false;
        }
        self.queue.enqueue(method, endpoint, body.map(str::to_owned))
    }
}
