//! Core of the Tabula data-persistence client.
//!
//! This crate is synchronous and performs no I/O. It provides:
//!
//! - a WKT codec for [`Geometry`] values ([`wkt`]);
//! - the [`Entity`] model with static field descriptors, a name-based
//!   [`EntityRegistry`] and column/table [`Mappings`];
//! - a [`Session`] owning the identity map that ties local instances to
//!   remote object ids;
//! - the [`mapper`] converting entities to and from JSON maps;
//! - the [`request`] shaper producing REST paths, verbs and bodies.
//!
//! Sending requests is the job of `tabula-http`.

pub mod entity;
pub mod geo_point;
pub mod geometry;
pub mod identity;
pub mod mapper;
pub mod query;
pub mod registry;
pub mod request;
pub mod session;
pub mod wkt;

#[doc(hidden)]
pub mod test_support;

pub use entity::{
    AnyEntity, Entity, FieldDescriptor, FieldError, FieldKind, InstanceKey, Property, USER_CLASS,
    USERS_TABLE, User,
};
pub use geo_point::{GEO_POINT_CLASS, GeoPoint};
pub use geometry::{Geometry, Polygon};
pub use identity::{IdentityMap, StoredObject};
pub use mapper::{Mapped, MappingError, MappingIssue, Record};
pub use query::{DataQueryBuilder, LoadRelationsQueryBuilder};
pub use registry::{EntityRegistry, Mappings};
pub use request::{
    HttpMethod, RelationTarget, RelationVerb, RequestError, RequestShaper, RestRequest,
};
pub use session::{Session, SessionConfig, TEST_NAMESPACE};
pub use wkt::WktError;
