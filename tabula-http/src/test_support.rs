//! Test double for [`Transport`].
//!
//! [`StubTransport`] replays canned responses in order and records every
//! request it receives, so tests can assert on both sides of an exchange
//! without a network.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tabula_core::RequestShaper;
//! use tabula_http::Transport;
//! use tabula_http::test_support::StubTransport;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let stub = StubTransport::new().with_json(200, json!([]));
//! let raw = stub.execute(&RequestShaper::new("Person").describe()).await.unwrap();
//! assert_eq!(raw.body, b"[]");
//! assert_eq!(stub.requests().len(), 1);
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tabula_core::RestRequest;

use crate::transport::{RawResponse, Transport, TransportError};

/// Replays canned responses and records requests.
#[derive(Debug, Default)]
pub struct StubTransport {
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<RestRequest>>,
}

impl StubTransport {
    /// Stub with no canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with a raw body.
    #[must_use]
    pub fn with_body(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(Ok(RawResponse::new(status, body)));
        self
    }

    /// Queue a response with a JSON body.
    #[must_use]
    pub fn with_json(self, status: u16, body: Value) -> Self {
        self.with_body(status, body.to_string())
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn with_error(self, error: TransportError) -> Self {
        self.push(Err(error));
        self
    }

    /// Queue a response on a shared stub.
    pub fn push(&self, response: Result<RawResponse, TransportError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<RestRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, request: &RestRequest) -> Result<RawResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Network {
                    url: request.path.clone(),
                    message: "no canned response left".to_owned(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use tabula_core::RequestShaper;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime should build")
            .block_on(future)
    }

    #[rstest]
    fn replays_in_order_and_records() {
        let stub = StubTransport::new()
            .with_json(200, json!({"a": 1}))
            .with_body(500, "boom");
        let shaper = RequestShaper::new("Person");

        let first = block_on(stub.execute(&shaper.describe())).expect("first");
        let second = block_on(stub.execute(&shaper.find(None))).expect("second");

        assert_eq!(first.status, 200);
        assert_eq!(second, RawResponse::new(500, "boom"));
        let paths: Vec<_> = stub.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, ["data/Person/properties", "data/Person/find"]);
    }

    #[rstest]
    fn exhausted_stub_fails() {
        let stub = StubTransport::new();
        let err = block_on(stub.execute(&RequestShaper::new("Person").describe()))
            .expect_err("no response queued");
        assert!(matches!(err, TransportError::Network { .. }));
    }

    #[rstest]
    fn queued_error_is_returned() {
        let error = TransportError::Timeout {
            url: "u".into(),
            timeout_secs: 1,
        };
        let stub = StubTransport::new().with_error(error.clone());
        let result = block_on(stub.execute(&RequestShaper::new("Person").describe()));
        assert_eq!(result, Err(error));
    }
}
