//! Session context threaded through mapper and store calls.

use crate::identity::IdentityMap;
use crate::registry::{EntityRegistry, Mappings};

/// Namespace used to qualify class names when none is configured.
pub const TEST_NAMESPACE: &str = "Tests";

/// Settings for a [`Session`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Namespace qualifying class names, e.g. the application name.
    pub namespace: Option<String>,
}

impl SessionConfig {
    /// Configuration with the given namespace.
    #[must_use]
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }
}

/// Owns the identity map together with the registry and mappings it is
/// interpreted against.
///
/// Share a session between tasks with `Arc`. Every fetched or saved instance
/// adds an identity entry, which is dropped only when a write invalidates it
/// or through [`IdentityMap::clear`]. Scope a session to a unit of work, or
/// clear it between units.
///
/// # Examples
///
/// ```
/// use tabula_core::{EntityRegistry, Mappings, Session, SessionConfig};
/// use tabula_core::test_support::Person;
///
/// let session = Session::new(
///     SessionConfig::with_namespace("Shop"),
///     EntityRegistry::new().with::<Person>(),
///     Mappings::new(),
/// );
/// assert_eq!(session.namespace(), "Shop");
/// assert!(session.identities().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Session {
    config: SessionConfig,
    registry: EntityRegistry,
    mappings: Mappings,
    identities: IdentityMap,
}

impl Session {
    /// Create a session with an empty identity map.
    #[must_use]
    pub fn new(config: SessionConfig, registry: EntityRegistry, mappings: Mappings) -> Self {
        Self {
            config,
            registry,
            mappings,
            identities: IdentityMap::new(),
        }
    }

    /// Configured namespace, or [`TEST_NAMESPACE`].
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.config.namespace.as_deref().unwrap_or(TEST_NAMESPACE)
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Entity registry.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Column and table mappings.
    #[must_use]
    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    /// Identity map.
    #[must_use]
    pub fn identities(&self) -> &IdentityMap {
        &self.identities
    }
}
