//! Facade crate for the Tabula data-persistence client.
//!
//! This crate re-exports the synchronous core (WKT codec, entity mapper,
//! request shaper) and exposes the async HTTP data store behind the `http`
//! feature.

#![forbid(unsafe_code)]

pub use tabula_core::{
    AnyEntity, DataQueryBuilder, Entity, EntityRegistry, FieldDescriptor, FieldError, FieldKind,
    GeoPoint, Geometry, IdentityMap, InstanceKey, LoadRelationsQueryBuilder, Mapped,
    MappingError, MappingIssue, Mappings, Polygon, Property, Record, RelationTarget,
    RequestError, RequestShaper, RestRequest, Session, SessionConfig, User, WktError, mapper,
    wkt,
};

#[cfg(feature = "http")]
pub use tabula_http::{
    DataStore, EntityStore, Fault, HttpTransport, ObjectProperty, PersistenceError, RawResponse,
    TableStore, Transport, TransportBuildError, TransportConfig, TransportError,
};
