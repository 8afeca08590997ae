//! Sample entities and sessions shared by unit, behaviour and doc tests.

use serde_json::Value;

use crate::{
    Entity, EntityRegistry, FieldDescriptor, FieldError, GeoPoint, Geometry, InstanceKey,
    Mappings, Property, Session, SessionConfig, User,
};

/// A person whose `age` is stored remotely in the `years` column by
/// [`sample_session`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    /// Local identity.
    pub key: InstanceKey,
    /// Display name.
    pub name: Option<String>,
    /// Age in years.
    pub age: Option<i64>,
}

impl Person {
    /// Named person of the given age.
    pub fn new(name: &str, age: i64) -> Self {
        Self {
            name: Some(name.to_owned()),
            age: Some(age),
            ..Self::default()
        }
    }
}

impl Entity for Person {
    const KIND: &'static str = "Person";
    const FIELDS: &'static [FieldDescriptor] =
        &[FieldDescriptor::value("name"), FieldDescriptor::value("age")];

    fn key(&self) -> InstanceKey {
        self.key
    }

    fn get(&self, field: &str) -> Option<Property> {
        match field {
            "name" => self.name.clone().map(Property::from),
            "age" => self.age.map(Property::from),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Property) -> Result<(), FieldError> {
        match field {
            "name" => self.name = Some(value.into_value(field)?),
            "age" => self.age = Some(value.into_value(field)?),
            _ => return Err(FieldError::unknown(Self::KIND, field)),
        }
        Ok(())
    }
}

/// A team exercising every field kind. `name` is stored in the `title`
/// column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Team {
    /// Local identity.
    pub key: InstanceKey,
    /// Team name.
    pub name: Option<String>,
    /// Single relation.
    pub leader: Option<Person>,
    /// Relation list.
    pub members: Vec<Person>,
    /// Geometry column.
    pub area: Option<Geometry>,
    /// Geo-point column.
    pub headquarters: Option<GeoPoint>,
    /// User column.
    pub manager: Option<User>,
    /// Free-form JSON column.
    pub notes: Option<Value>,
}

impl Entity for Team {
    const KIND: &'static str = "Team";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::value("name").with_column("title"),
        FieldDescriptor::relation("leader"),
        FieldDescriptor::relation_list("members"),
        FieldDescriptor::geometry("area"),
        FieldDescriptor::geo_point("headquarters"),
        FieldDescriptor::user("manager"),
        FieldDescriptor::value("notes"),
    ];

    fn key(&self) -> InstanceKey {
        self.key
    }

    fn get(&self, field: &str) -> Option<Property> {
        match field {
            "name" => self.name.clone().map(Property::from),
            "leader" => self.leader.clone().map(Property::entity),
            "members" => Some(Property::entities(self.members.iter().cloned())),
            "area" => self.area.clone().map(Property::from),
            "headquarters" => self.headquarters.clone().map(Property::from),
            "manager" => self.manager.clone().map(Property::from),
            "notes" => self.notes.clone().map(Property::from),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Property) -> Result<(), FieldError> {
        match field {
            "name" => self.name = Some(value.into_value(field)?),
            "leader" => self.leader = Some(value.into_entity(field)?),
            "members" => self.members = value.into_entities(field)?,
            "area" => self.area = Some(value.into_geometry(field)?),
            "headquarters" => self.headquarters = Some(value.into_geo_point(field)?),
            "manager" => self.manager = Some(value.into_user(field)?),
            "notes" => self.notes = Some(value.into_value(field)?),
            _ => return Err(FieldError::unknown(Self::KIND, field)),
        }
        Ok(())
    }
}

/// Registry knowing [`Person`] and [`Team`].
pub fn sample_registry() -> EntityRegistry {
    EntityRegistry::new().with::<Person>().with::<Team>()
}

/// Session over [`sample_registry`] mapping `Person.age` to the `years`
/// column.
pub fn sample_session() -> Session {
    Session::new(
        SessionConfig::default(),
        sample_registry(),
        Mappings::new().with_column(Person::KIND, "years", "age"),
    )
}
