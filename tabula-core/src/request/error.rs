use thiserror::Error;

/// Errors raised while shaping a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// An update was requested for a map without `objectId`.
    #[error("entity has no objectId to update")]
    MissingObjectId,
    /// An identifier needed in the path was empty.
    #[error("{segment} must not be empty")]
    EmptySegment {
        /// Which path segment was empty.
        segment: &'static str,
    },
}
