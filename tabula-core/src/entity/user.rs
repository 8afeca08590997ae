//! The distinguished user kind.

use serde_json::{Map, Value};

use crate::mapper::OBJECT_ID_KEY;

/// Class name of the user kind.
pub const USER_CLASS: &str = "BackendlessUser";
/// Table backing the user kind.
pub const USERS_TABLE: &str = "Users";

const EMAIL_KEY: &str = "email";

/// A user record: a bag of properties keyed by column name.
///
/// Users are not described by field descriptors; every column the service
/// returns is kept.
///
/// # Examples
///
/// ```
/// use tabula_core::User;
///
/// let user = User::new()
///     .with_property("email", "ada@example.com")
///     .with_property("objectId", "u-1");
/// assert_eq!(user.email(), Some("ada@example.com"));
/// assert_eq!(user.object_id(), Some("u-1"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct User {
    properties: Map<String, Value>,
}

impl User {
    /// Empty user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a user from every entry of a response map.
    #[must_use]
    pub fn from_map(properties: Map<String, Value>) -> Self {
        Self { properties }
    }

    /// Set a property, returning the updated user.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value);
        self
    }

    /// Set a property in place.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Look up a property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// The `email` property when it is a string.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.property(EMAIL_KEY).and_then(Value::as_str)
    }

    /// The `objectId` property when it is a string.
    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        self.property(OBJECT_ID_KEY).and_then(Value::as_str)
    }

    /// All properties.
    #[must_use]
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Consume the user, returning its properties.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.properties
    }
}
