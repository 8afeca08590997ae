//! Conversion between entities and the JSON maps exchanged with the service.
//!
//! Outgoing entities are flattened through their field descriptors; incoming
//! maps are turned back into entities constructed from the session's
//! registry. Nested objects are recognised by their `___class` tag:
//!
//! - `Users` becomes a [`User`];
//! - `GeoPoint` becomes a [`GeoPoint`];
//! - any other tag is mapped recursively, using the tag as the table.
//!
//! Reading a map never stops at a bad field. Problems are returned alongside
//! the entity as [`MappingIssue`]s and logged.

use log::warn;
use serde_json::{Map, Value};

use crate::entity::{
    AnyEntity, Entity, FieldDescriptor, FieldKind, Property, USER_CLASS, USERS_TABLE, User,
    find_field,
};
use crate::geo_point::{GEO_POINT_CLASS, GeoPoint};
use crate::session::Session;
use crate::wkt::parse_wkt;

mod error;

pub use error::MappingError;

/// Key carrying the class tag of nested objects.
pub const CLASS_KEY: &str = "___class";
/// Key carrying the remote object id.
pub const OBJECT_ID_KEY: &str = "objectId";

/// Result of reading a map: the value plus anything that was skipped.
#[derive(Debug)]
pub struct Mapped<T> {
    /// Mapped value.
    pub value: T,
    /// Fields or elements that could not be mapped.
    pub issues: Vec<MappingIssue>,
}

impl<T> Mapped<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            issues: Vec::new(),
        }
    }

    /// Whether every field mapped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Drop the issues.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Convert the value, keeping the issues.
    ///
    /// # Errors
    ///
    /// Propagates the conversion error.
    pub fn try_map<U>(
        self,
        convert: impl FnOnce(T) -> Result<U, MappingError>,
    ) -> Result<Mapped<U>, MappingError> {
        Ok(Mapped {
            value: convert(self.value)?,
            issues: self.issues,
        })
    }
}

/// A field or relation element skipped while reading a map.
#[derive(Debug)]
pub struct MappingIssue {
    /// Path of the offending key, e.g. `members[2].age`.
    pub field: String,
    /// Why it was skipped.
    pub error: MappingError,
}

/// A record read from a map: a user or a registered entity.
#[derive(Debug)]
pub enum Record {
    /// Row of the `Users` table.
    User(User),
    /// Any other row.
    Entity(Box<dyn AnyEntity>),
}

impl Record {
    /// Kind name of the record.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => USER_CLASS,
            Self::Entity(entity) => entity.kind(),
        }
    }

    /// Downcast to a typed entity.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnexpectedRecord`] when the record is a user or
    /// another kind.
    pub fn into_entity<E: Entity>(self) -> Result<E, MappingError> {
        let found = self.kind();
        match self {
            Self::Entity(entity) => entity
                .into_any()
                .downcast::<E>()
                .map(|boxed| *boxed)
                .map_err(|_| MappingError::UnexpectedRecord {
                    expected: E::KIND,
                    found,
                }),
            Self::User(_) => Err(MappingError::UnexpectedRecord {
                expected: E::KIND,
                found,
            }),
        }
    }

    /// Take the user out of the record.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnexpectedRecord`] for entity records.
    pub fn into_user(self) -> Result<User, MappingError> {
        match self {
            Self::User(user) => Ok(user),
            Self::Entity(entity) => Err(MappingError::UnexpectedRecord {
                expected: USER_CLASS,
                found: entity.kind(),
            }),
        }
    }
}

/// Table backing `kind`: the user class maps to `Users`, anything else to
/// itself.
#[must_use]
pub fn table_name(kind: &str) -> &str {
    if kind == USER_CLASS { USERS_TABLE } else { kind }
}

/// Namespace-qualified class name for a table or kind name.
///
/// `Users` becomes the user class. The session namespace falls back to
/// [`TEST_NAMESPACE`](crate::TEST_NAMESPACE).
///
/// # Examples
///
/// ```
/// use tabula_core::{Session, mapper::class_name};
///
/// let session = Session::default();
/// assert_eq!(class_name(&session, "Users"), "Tests.BackendlessUser");
/// assert_eq!(class_name(&session, "Person"), "Tests.Person");
/// ```
#[must_use]
pub fn class_name(session: &Session, name: &str) -> String {
    let name = if name == USERS_TABLE { USER_CLASS } else { name };
    format!("{}.{name}", session.namespace())
}

/// Remote id remembered for `entity`.
#[must_use]
pub fn object_id(session: &Session, entity: &dyn AnyEntity) -> Option<String> {
    session.identities().object_id(entity.instance_key())
}

/// Properties of a user as sent to the service.
#[must_use]
pub fn user_to_dictionary(user: &User) -> Map<String, Value> {
    user.properties().clone()
}

/// Flatten `entity` into the map sent to the service.
///
/// Keys come from the session's column mapping, then the descriptor alias,
/// then the field name. Unset fields are omitted and `objectId` is added when
/// the instance has a remembered id.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabula_core::{Mappings, Session, SessionConfig, EntityRegistry};
/// use tabula_core::mapper::entity_to_dictionary;
/// use tabula_core::test_support::Person;
///
/// let session = Session::new(
///     SessionConfig::default(),
///     EntityRegistry::new().with::<Person>(),
///     Mappings::new().with_column("Person", "years", "age"),
/// );
/// let map = entity_to_dictionary(&session, &Person::new("a", 3));
/// assert_eq!(serde_json::Value::Object(map), json!({"name": "a", "years": 3}));
/// ```
#[must_use]
pub fn entity_to_dictionary(session: &Session, entity: &dyn AnyEntity) -> Map<String, Value> {
    let mut map = Map::new();
    for descriptor in entity.fields() {
        let Some(property) = entity.read(descriptor.name()) else {
            continue;
        };
        map.insert(
            outgoing_key(session, entity.kind(), descriptor),
            property_to_value(session, property),
        );
    }
    if let Some(object_id) = object_id(session, entity) {
        map.insert(OBJECT_ID_KEY.to_owned(), Value::String(object_id));
    }
    map
}

fn outgoing_key(session: &Session, kind: &str, descriptor: &FieldDescriptor) -> String {
    session
        .mappings()
        .column_for_property(kind, descriptor.name())
        .unwrap_or(descriptor.column_name())
        .to_owned()
}

fn property_to_value(session: &Session, property: Property) -> Value {
    match property {
        Property::Value(value) => value,
        Property::Geometry(geometry) => Value::String(geometry.as_wkt()),
        Property::GeoPoint(point) => Value::Object(point.to_map()),
        Property::User(user) => {
            let mut map = user_to_dictionary(&user);
            map.insert(CLASS_KEY.to_owned(), Value::from(USERS_TABLE));
            Value::Object(map)
        }
        Property::Entity(entity) => {
            let mut map = entity_to_dictionary(session, entity.as_ref());
            map.insert(
                CLASS_KEY.to_owned(),
                Value::from(table_name(entity.kind())),
            );
            Value::Object(map)
        }
        Property::List(items) => Value::Array(
            items
                .into_iter()
                .map(|item| property_to_value(session, item))
                .collect(),
        ),
    }
}

/// Build a record from a map read from `table`.
///
/// The kind is taken from the session's table mapping for `table`, else from
/// `kind_hint`. Rows of the `Users` table become [`Record::User`]. When the
/// map carries an `objectId` it is remembered for the new instance.
///
/// # Errors
///
/// Returns [`MappingError::UnresolvedKind`] when no registered kind matches.
/// Failures of individual fields are reported in [`Mapped::issues`] instead.
pub fn dictionary_to_entity(
    session: &Session,
    table: &str,
    map: &Map<String, Value>,
    kind_hint: Option<&str>,
) -> Result<Mapped<Record>, MappingError> {
    if table == USERS_TABLE {
        return Ok(Mapped::clean(Record::User(User::from_map(map.clone()))));
    }

    let kind = session
        .mappings()
        .class_for_table(table)
        .or(kind_hint)
        .ok_or_else(|| MappingError::UnresolvedKind {
            table: table.to_owned(),
            hint: None,
        })?;
    let mut entity =
        session
            .registry()
            .construct(kind)
            .ok_or_else(|| MappingError::UnresolvedKind {
                table: table.to_owned(),
                hint: Some(kind.to_owned()),
            })?;

    let mut reader = Reader {
        session,
        kind: entity.kind(),
        issues: Vec::new(),
    };
    for (key, value) in map {
        if value.is_null() {
            continue;
        }
        let Some(descriptor) = incoming_field(session, entity.as_ref(), key) else {
            continue;
        };
        let Some(property) = reader.convert(key, descriptor, value) else {
            continue;
        };
        if let Err(error) = entity.write(descriptor.name(), property) {
            reader.report(key.clone(), error.into());
        }
    }

    if let Some(object_id) = map.get(OBJECT_ID_KEY).and_then(Value::as_str) {
        session
            .identities()
            .remember(entity.instance_key(), object_id, table);
    }
    Ok(Mapped {
        value: Record::Entity(entity),
        issues: reader.issues,
    })
}

/// Read a map from `E`'s own table into an `E`.
///
/// # Errors
///
/// As [`dictionary_to_entity`], plus [`MappingError::UnexpectedRecord`] when
/// the table mapping resolves to a different kind.
pub fn dictionary_to<E: Entity>(
    session: &Session,
    map: &Map<String, Value>,
) -> Result<Mapped<E>, MappingError> {
    dictionary_to_entity(session, table_name(E::KIND), map, Some(E::KIND))?
        .try_map(Record::into_entity)
}

/// Runtime column mapping first, then declared names and aliases.
fn incoming_field(
    session: &Session,
    entity: &dyn AnyEntity,
    key: &str,
) -> Option<&'static FieldDescriptor> {
    let fields = entity.fields();
    session
        .mappings()
        .property_for_column(entity.kind(), key)
        .and_then(|property| fields.iter().find(|field| field.name() == property))
        .or_else(|| find_field(fields, key))
}

struct Reader<'a> {
    session: &'a Session,
    kind: &'static str,
    issues: Vec<MappingIssue>,
}

impl Reader<'_> {
    fn report(&mut self, field: String, error: MappingError) {
        warn!("skipping {}.{field} while mapping: {error}", self.kind);
        self.issues.push(MappingIssue { field, error });
    }

    fn convert(
        &mut self,
        key: &str,
        descriptor: &FieldDescriptor,
        value: &Value,
    ) -> Option<Property> {
        match value {
            Value::Object(object) => match object.get(CLASS_KEY).and_then(Value::as_str) {
                Some(tag) => self.nested(key, tag, object),
                None => Some(Property::Value(value.clone())),
            },
            Value::Array(items)
                if descriptor.kind() == FieldKind::RelationList
                    || items.iter().any(is_tagged) =>
            {
                Some(Property::List(self.relation_list(key, items)))
            }
            Value::String(text) if descriptor.kind() == FieldKind::Geometry => {
                match parse_wkt(text) {
                    Ok(geometry) => Some(Property::Geometry(geometry)),
                    Err(error) => {
                        self.report(key.to_owned(), error.into());
                        None
                    }
                }
            }
            _ => Some(Property::Value(value.clone())),
        }
    }

    /// Accumulate every resolvable element, then hand back the whole list.
    fn relation_list(&mut self, key: &str, items: &[Value]) -> Vec<Property> {
        let mut relations = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let path = format!("{key}[{index}]");
            let tagged = item.as_object().and_then(|object| {
                object
                    .get(CLASS_KEY)
                    .and_then(Value::as_str)
                    .map(|tag| (tag, object))
            });
            match tagged {
                Some((tag, object)) => relations.extend(self.nested(&path, tag, object)),
                None => self.report(path, MappingError::MissingClassTag),
            }
        }
        relations
    }

    fn nested(&mut self, path: &str, tag: &str, object: &Map<String, Value>) -> Option<Property> {
        match tag {
            USERS_TABLE => Some(Property::User(User::from_map(object.clone()))),
            GEO_POINT_CLASS => match GeoPoint::from_map(object) {
                Some(point) => Some(Property::GeoPoint(point)),
                None => {
                    self.report(path.to_owned(), MappingError::InvalidGeoPoint);
                    None
                }
            },
            _ => {
                let hint = class_name(self.session, tag);
                match dictionary_to_entity(self.session, tag, object, Some(&hint)) {
                    Ok(mapped) => {
                        self.issues
                            .extend(mapped.issues.into_iter().map(|issue| MappingIssue {
                                field: format!("{path}.{}", issue.field),
                                error: issue.error,
                            }));
                        Some(match mapped.value {
                            Record::Entity(entity) => Property::Entity(entity),
                            Record::User(user) => Property::User(user),
                        })
                    }
                    Err(error) => {
                        self.report(path.to_owned(), error);
                        None
                    }
                }
            }
        }
    }
}

fn is_tagged(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.get(CLASS_KEY).is_some_and(Value::is_string))
}
