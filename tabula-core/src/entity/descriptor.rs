//! Static field descriptors consulted by the mapper.

/// What a field holds, deciding how the mapper converts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A scalar or other plain JSON value.
    Value,
    /// A [`Geometry`](crate::Geometry) exchanged as WKT.
    Geometry,
    /// A [`GeoPoint`](crate::GeoPoint).
    GeoPoint,
    /// A [`User`](crate::User).
    User,
    /// A single related entity.
    Relation,
    /// A list of related entities.
    RelationList,
}

/// Declaration of one entity field.
///
/// # Examples
///
/// ```
/// use tabula_core::{FieldDescriptor, FieldKind};
///
/// const AGE: FieldDescriptor = FieldDescriptor::value("age").with_column("years");
/// assert_eq!(AGE.name(), "age");
/// assert_eq!(AGE.column_name(), "years");
/// assert_eq!(AGE.kind(), FieldKind::Value);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    name: &'static str,
    column: Option<&'static str>,
    kind: FieldKind,
}

impl FieldDescriptor {
    /// Describe a field of the given kind.
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column: None,
            kind,
        }
    }

    /// Plain value field.
    #[must_use]
    pub const fn value(name: &'static str) -> Self {
        Self::new(name, FieldKind::Value)
    }

    /// Geometry field.
    #[must_use]
    pub const fn geometry(name: &'static str) -> Self {
        Self::new(name, FieldKind::Geometry)
    }

    /// Geo-point field.
    #[must_use]
    pub const fn geo_point(name: &'static str) -> Self {
        Self::new(name, FieldKind::GeoPoint)
    }

    /// User field.
    #[must_use]
    pub const fn user(name: &'static str) -> Self {
        Self::new(name, FieldKind::User)
    }

    /// Single relation field.
    #[must_use]
    pub const fn relation(name: &'static str) -> Self {
        Self::new(name, FieldKind::Relation)
    }

    /// Relation list field.
    #[must_use]
    pub const fn relation_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::RelationList)
    }

    /// Declare the remote column the field is stored in.
    #[must_use]
    pub const fn with_column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// Local field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared column alias, if any.
    #[must_use]
    pub const fn column(&self) -> Option<&'static str> {
        self.column
    }

    /// Field kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Column alias, falling back to the field name.
    #[must_use]
    pub const fn column_name(&self) -> &'static str {
        match self.column {
            Some(column) => column,
            None => self.name,
        }
    }

    /// Whether `key` names this field, either directly or through its alias.
    #[must_use]
    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.column == Some(key)
    }
}
