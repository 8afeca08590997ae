use thiserror::Error;

use crate::entity::FieldError;
use crate::wkt::WktError;

/// Errors raised while converting between entities and maps.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Neither the table mapping nor the hint named a registered kind.
    #[error("no registered entity kind for table `{table}` (hint: {hint:?})")]
    UnresolvedKind {
        /// Table the map was read from.
        table: String,
        /// Kind name that was tried, if any.
        hint: Option<String>,
    },
    /// The entity rejected a field value.
    #[error(transparent)]
    Field(#[from] FieldError),
    /// A geometry column held text that is not valid WKT.
    #[error("invalid geometry: {source}")]
    InvalidGeometry {
        /// Codec error.
        #[from]
        source: WktError,
    },
    /// A `GeoPoint`-tagged object lacked numeric coordinates.
    #[error("geo-point object is missing latitude or longitude")]
    InvalidGeoPoint,
    /// A relation list element carried no `___class` tag.
    #[error("relation element has no class tag")]
    MissingClassTag,
    /// A list response element was not a JSON object.
    #[error("expected an object but found {found}")]
    NotAnObject {
        /// JSON type of the element.
        found: &'static str,
    },
    /// The mapped record was not of the requested shape.
    #[error("expected {expected} but the record is {found}")]
    UnexpectedRecord {
        /// Requested kind.
        expected: &'static str,
        /// Kind that was produced.
        found: &'static str,
    },
}
