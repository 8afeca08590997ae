//! Dynamically typed field values passed between entities and the mapper.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{AnyEntity, Entity, FieldError};
use crate::{GeoPoint, Geometry, User};

/// A field value in transit between an entity and the mapper.
#[derive(Debug)]
pub enum Property {
    /// Plain JSON value.
    Value(Value),
    /// Geometry value.
    Geometry(Geometry),
    /// Geo-point value.
    GeoPoint(GeoPoint),
    /// User record.
    User(User),
    /// Related entity.
    Entity(Box<dyn AnyEntity>),
    /// List of related values.
    List(Vec<Property>),
}

impl Clone for Property {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Geometry(geometry) => Self::Geometry(geometry.clone()),
            Self::GeoPoint(point) => Self::GeoPoint(point.clone()),
            Self::User(user) => Self::User(user.clone()),
            Self::Entity(entity) => Self::Entity(entity.clone_boxed()),
            Self::List(items) => Self::List(items.clone()),
        }
    }
}

impl Property {
    /// Wrap a typed entity.
    pub fn entity<E: Entity>(entity: E) -> Self {
        Self::Entity(Box::new(entity))
    }

    /// Wrap a list of typed entities.
    pub fn entities<E: Entity>(entities: impl IntoIterator<Item = E>) -> Self {
        Self::List(entities.into_iter().map(Self::entity).collect())
    }

    /// Short description of the variant, used in error messages.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Value(_) => "a value",
            Self::Geometry(_) => "a geometry",
            Self::GeoPoint(_) => "a geo-point",
            Self::User(_) => "a user",
            Self::Entity(_) => "an entity",
            Self::List(_) => "a list",
        }
    }

    fn mismatch(&self, field: &str, expected: &'static str) -> FieldError {
        FieldError::TypeMismatch {
            field: field.to_owned(),
            expected,
            found: self.describe(),
        }
    }

    /// Decode a plain value into `T`.
    pub fn into_value<T: DeserializeOwned>(self, field: &str) -> Result<T, FieldError> {
        match self {
            Self::Value(value) => serde_json::from_value(value).map_err(|source| {
                FieldError::Decode {
                    field: field.to_owned(),
                    source,
                }
            }),
            other => Err(other.mismatch(field, "a value")),
        }
    }

    /// Take the geometry out of the property.
    pub fn into_geometry(self, field: &str) -> Result<Geometry, FieldError> {
        match self {
            Self::Geometry(geometry) => Ok(geometry),
            other => Err(other.mismatch(field, "a geometry")),
        }
    }

    /// Take the geo-point out of the property.
    pub fn into_geo_point(self, field: &str) -> Result<GeoPoint, FieldError> {
        match self {
            Self::GeoPoint(point) => Ok(point),
            other => Err(other.mismatch(field, "a geo-point")),
        }
    }

    /// Take the user out of the property.
    pub fn into_user(self, field: &str) -> Result<User, FieldError> {
        match self {
            Self::User(user) => Ok(user),
            other => Err(other.mismatch(field, "a user")),
        }
    }

    /// Downcast a related entity to `E`.
    pub fn into_entity<E: Entity>(self, field: &str) -> Result<E, FieldError> {
        match self {
            Self::Entity(entity) => {
                let found = entity.kind();
                entity
                    .into_any()
                    .downcast::<E>()
                    .map(|boxed| *boxed)
                    .map_err(|_| FieldError::TypeMismatch {
                        field: field.to_owned(),
                        expected: E::KIND,
                        found,
                    })
            }
            other => Err(other.mismatch(field, E::KIND)),
        }
    }

    /// Downcast every element of a relation list to `E`.
    pub fn into_entities<E: Entity>(self, field: &str) -> Result<Vec<E>, FieldError> {
        match self {
            Self::List(items) => items
                .into_iter()
                .map(|item| item.into_entity(field))
                .collect(),
            other => Err(other.mismatch(field, "a list")),
        }
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Geometry> for Property {
    fn from(geometry: Geometry) -> Self {
        Self::Geometry(geometry)
    }
}

impl From<GeoPoint> for Property {
    fn from(point: GeoPoint) -> Self {
        Self::GeoPoint(point)
    }
}

impl From<User> for Property {
    fn from(user: User) -> Self {
        Self::User(user)
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for Property {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for Property {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Person, Team};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn decodes_plain_values() {
        let age: u32 = Property::from(json!(41)).into_value("age").expect("number");
        assert_eq!(age, 41);
    }

    #[rstest]
    fn reports_decode_failures() {
        let err = Property::from("old")
            .into_value::<u32>("age")
            .expect_err("string is not a number");
        assert!(matches!(err, FieldError::Decode { ref field, .. } if field == "age"));
    }

    #[rstest]
    fn downcasts_entities_by_kind() {
        let person = Person::new("Ada", 36);
        let restored: Person = Property::entity(person.clone())
            .into_entity("leader")
            .expect("same kind");
        assert_eq!(restored, person);

        let err = Property::entity(Team::default())
            .into_entity::<Person>("leader")
            .expect_err("wrong kind");
        assert!(matches!(
            err,
            FieldError::TypeMismatch { expected: "Person", found: "Team", .. }
        ));
    }

    #[rstest]
    fn clones_keep_entity_identity() {
        let person = Person::new("Grace", 45);
        let property = Property::entity(person.clone());
        let copy = property.clone();
        match copy {
            Property::Entity(entity) => assert_eq!(entity.instance_key(), person.key()),
            other => panic!("expected an entity, got {other:?}"),
        }
    }

    #[rstest]
    fn list_of_wrong_shape_is_rejected() {
        let err = Property::from(json!([1, 2]))
            .into_entities::<Person>("members")
            .expect_err("value is not a relation list");
        assert!(matches!(err, FieldError::TypeMismatch { expected: "a list", .. }));
    }
}
