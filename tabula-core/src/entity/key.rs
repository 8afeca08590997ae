//! Local identity for entity instances.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique key identifying one local entity instance.
///
/// The key is what the identity map associates with a remote `objectId`.
/// `Default` allocates a fresh key, so a struct deriving `Default` gets a new
/// identity for every instance it constructs. Cloning an entity keeps its
/// key: both values stand for the same remote row.
///
/// # Examples
///
/// ```
/// use tabula_core::InstanceKey;
///
/// let first = InstanceKey::default();
/// let second = InstanceKey::default();
/// assert_ne!(first, second);
/// assert_eq!(first, first.clone());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey(u64);

impl InstanceKey {
    /// Allocate a key never handed out before in this process.
    #[must_use]
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, useful in log output.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for InstanceKey {
    fn default() -> Self {
        Self::fresh()
    }
}
