//! Errors surfaced by data-store operations.

use serde::Deserialize;
use tabula_core::{MappingError, RequestError};
use thiserror::Error;

use crate::transport::TransportError;

/// Error reported by the service itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("service fault {code} (HTTP {status}): {message}")]
pub struct Fault {
    /// Service error code; the HTTP status when the body carries none.
    #[serde(default)]
    pub code: i64,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// HTTP status of the response.
    #[serde(skip)]
    pub status: u16,
}

/// Failure of a data-store operation.
///
/// Every operation resolves to exactly one of its success value or one of
/// these.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The service answered with an error.
    #[error(transparent)]
    Fault(#[from] Fault),
    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The request could not be shaped.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// A returned record could not be mapped.
    #[error(transparent)]
    Mapping(#[from] MappingError),
    /// The body was not the JSON the operation expects.
    #[error("failed to decode response body: {source}")]
    Decode {
        /// Decoder error.
        #[from]
        source: serde_json::Error,
    },
    /// A count response was not a decimal integer.
    #[error("count response is not an integer: {body:?}")]
    InvalidCount {
        /// Body text.
        body: String,
    },
    /// The body decoded but did not carry the expected value.
    #[error("unexpected response payload, expected {expected}")]
    UnexpectedPayload {
        /// What the operation was looking for.
        expected: &'static str,
    },
}
