//! Name-to-constructor registry and column/table name mappings.

use std::collections::HashMap;

use crate::entity::{AnyEntity, Entity};

type Constructor = fn() -> Box<dyn AnyEntity>;

fn construct_default<E: Entity>() -> Box<dyn AnyEntity> {
    Box::new(E::default())
}

/// Registry of entity kinds that can be constructed by name.
///
/// Populate it at start-up with every kind a response may contain.
///
/// # Examples
///
/// ```
/// use tabula_core::EntityRegistry;
/// use tabula_core::test_support::Person;
///
/// let registry = EntityRegistry::new().with::<Person>();
/// let person = registry.construct("MyApp.Person").expect("short name resolves");
/// assert_eq!(person.kind(), "Person");
/// ```
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    constructors: HashMap<&'static str, Constructor>,
}

impl EntityRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `E` under its kind name.
    pub fn register<E: Entity>(&mut self) {
        self.constructors.insert(E::KIND, construct_default::<E>);
    }

    /// Builder form of [`EntityRegistry::register`].
    #[must_use]
    pub fn with<E: Entity>(mut self) -> Self {
        self.register::<E>();
        self
    }

    /// Whether `kind` resolves, qualified or not.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.resolve(kind).is_some()
    }

    /// Construct a default instance of `kind`.
    ///
    /// A qualified name such as `App.Person` that is not registered as such is
    /// retried with its short name `Person`.
    #[must_use]
    pub fn construct(&self, kind: &str) -> Option<Box<dyn AnyEntity>> {
        self.resolve(kind).map(|constructor| constructor())
    }

    fn resolve(&self, kind: &str) -> Option<Constructor> {
        self.constructors.get(kind).copied().or_else(|| {
            let short = kind.rsplit('.').next()?;
            self.constructors.get(short).copied()
        })
    }
}

/// Column/property mappings per kind plus the table-to-class table.
///
/// Remote column names need not match local field names (reserved words,
/// naming conventions). These runtime mappings take precedence over aliases
/// declared on [`FieldDescriptor`](crate::FieldDescriptor)s.
#[derive(Debug, Default, Clone)]
pub struct Mappings {
    columns: HashMap<String, HashMap<String, String>>,
    classes: HashMap<String, String>,
}

impl Mappings {
    /// No mappings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `column` of `kind`'s table to its local `property`.
    pub fn map_column(
        &mut self,
        kind: impl Into<String>,
        column: impl Into<String>,
        property: impl Into<String>,
    ) {
        self.columns
            .entry(kind.into())
            .or_default()
            .insert(column.into(), property.into());
    }

    /// Builder form of [`Mappings::map_column`].
    #[must_use]
    pub fn with_column(
        mut self,
        kind: impl Into<String>,
        column: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        self.map_column(kind, column, property);
        self
    }

    /// Map `table` to the entity kind it should be read as.
    pub fn map_table(&mut self, table: impl Into<String>, class: impl Into<String>) {
        self.classes.insert(table.into(), class.into());
    }

    /// Builder form of [`Mappings::map_table`].
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>, class: impl Into<String>) -> Self {
        self.map_table(table, class);
        self
    }

    /// Local property stored in `column` for `kind`.
    #[must_use]
    pub fn property_for_column(&self, kind: &str, column: &str) -> Option<&str> {
        self.columns
            .get(kind)
            .and_then(|columns| columns.get(column))
            .map(String::as_str)
    }

    /// Remote column storing `property` for `kind`.
    #[must_use]
    pub fn column_for_property(&self, kind: &str, property: &str) -> Option<&str> {
        self.columns.get(kind).and_then(|columns| {
            columns
                .iter()
                .find(|(_, mapped)| mapped.as_str() == property)
                .map(|(column, _)| column.as_str())
        })
    }

    /// Entity kind registered for `table`.
    #[must_use]
    pub fn class_for_table(&self, table: &str) -> Option<&str> {
        self.classes.get(table).map(String::as_str)
    }
}
