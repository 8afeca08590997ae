//! Entity model: the trait typed records implement so the mapper can read
//! and write them without reflection.
//!
//! An entity declares its kind name and a static list of
//! [`FieldDescriptor`]s. The mapper enumerates those descriptors, reads
//! values through [`Entity::get`] and writes them through [`Entity::set`].
//! [`AnyEntity`] is the object-safe view used wherever the concrete type is
//! only known at run time, for example when a nested relation is resolved
//! through the [`EntityRegistry`](crate::EntityRegistry).

use std::any::Any;
use std::fmt;

mod descriptor;
mod error;
mod key;
mod property;
mod user;

pub use descriptor::{FieldDescriptor, FieldKind};
pub use error::FieldError;
pub use key::InstanceKey;
pub use property::Property;
pub use user::{USER_CLASS, USERS_TABLE, User};

/// A typed record stored in a table.
///
/// # Examples
///
/// ```
/// use tabula_core::{Entity, FieldDescriptor, FieldError, InstanceKey, Property};
///
/// #[derive(Debug, Clone, Default)]
/// struct Note {
///     key: InstanceKey,
///     text: Option<String>,
/// }
///
/// impl Entity for Note {
///     const KIND: &'static str = "Note";
///     const FIELDS: &'static [FieldDescriptor] = &[FieldDescriptor::value("text")];
///
///     fn key(&self) -> InstanceKey {
///         self.key
///     }
///
///     fn get(&self, field: &str) -> Option<Property> {
///         match field {
///             "text" => self.text.clone().map(Property::from),
///             _ => None,
///         }
///     }
///
///     fn set(&mut self, field: &str, value: Property) -> Result<(), FieldError> {
///         match field {
///             "text" => self.text = Some(value.into_value(field)?),
///             _ => return Err(FieldError::unknown(Self::KIND, field)),
///         }
///         Ok(())
///     }
/// }
///
/// let mut note = Note::default();
/// note.set("text", Property::from("hello")).expect("text is a string");
/// assert_eq!(note.text.as_deref(), Some("hello"));
/// ```
pub trait Entity: Clone + fmt::Debug + Default + Send + Sync + 'static {
    /// Kind name, which is also the table name unless mapped otherwise.
    const KIND: &'static str;

    /// Declared fields, in serialisation order.
    const FIELDS: &'static [FieldDescriptor];

    /// Local identity of this instance.
    fn key(&self) -> InstanceKey;

    /// Read a field. `None` means the field is unset and is omitted from
    /// outgoing maps.
    fn get(&self, field: &str) -> Option<Property>;

    /// Write a field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when the field is unknown or the property has
    /// the wrong shape.
    fn set(&mut self, field: &str, value: Property) -> Result<(), FieldError>;
}

/// Object-safe view of an [`Entity`].
pub trait AnyEntity: fmt::Debug + Send + Sync {
    /// Kind name.
    fn kind(&self) -> &'static str;
    /// Declared fields.
    fn fields(&self) -> &'static [FieldDescriptor];
    /// Local identity.
    fn instance_key(&self) -> InstanceKey;
    /// See [`Entity::get`].
    fn read(&self, field: &str) -> Option<Property>;
    /// See [`Entity::set`].
    ///
    /// # Errors
    ///
    /// Propagates the entity's [`FieldError`].
    fn write(&mut self, field: &str, value: Property) -> Result<(), FieldError>;
    /// Clone behind a fresh box.
    fn clone_boxed(&self) -> Box<dyn AnyEntity>;
    /// Borrow as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Convert into [`Any`] for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Entity> AnyEntity for T {
    fn kind(&self) -> &'static str {
        T::KIND
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        T::FIELDS
    }

    fn instance_key(&self) -> InstanceKey {
        self.key()
    }

    fn read(&self, field: &str) -> Option<Property> {
        self.get(field)
    }

    fn write(&mut self, field: &str, value: Property) -> Result<(), FieldError> {
        self.set(field, value)
    }

    fn clone_boxed(&self) -> Box<dyn AnyEntity> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Find the descriptor of `kind`'s fields that `key` names directly or
/// through its declared alias.
pub(crate) fn find_field<'a>(
    fields: &'a [FieldDescriptor],
    key: &str,
) -> Option<&'a FieldDescriptor> {
    fields.iter().find(|descriptor| descriptor.answers_to(key))
}
