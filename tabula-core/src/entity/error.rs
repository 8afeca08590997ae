use thiserror::Error;

/// Errors raised when reading or writing an entity field.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The property held a different kind of value than the field stores.
    #[error("field `{field}` expects {expected} but received {found}")]
    TypeMismatch {
        /// Field being written.
        field: String,
        /// Kind the field accepts.
        expected: &'static str,
        /// Kind that was supplied.
        found: &'static str,
    },
    /// A JSON value could not be decoded into the field's Rust type.
    #[error("field `{field}` could not be decoded: {source}")]
    Decode {
        /// Field being written.
        field: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The entity has no field with this name.
    #[error("{kind} has no field `{field}`")]
    UnknownField {
        /// Entity kind.
        kind: &'static str,
        /// Requested field.
        field: String,
    },
}

impl FieldError {
    /// Convenience constructor for [`FieldError::UnknownField`].
    pub fn unknown(kind: &'static str, field: &str) -> Self {
        Self::UnknownField {
            kind,
            field: field.to_owned(),
        }
    }
}
