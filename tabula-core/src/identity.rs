//! Identity map associating local instances with remote object ids.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use log::debug;

use crate::entity::InstanceKey;

/// Remote identity remembered for one local instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Remote object id.
    pub object_id: String,
    /// Table the object was read from or written to.
    pub table: String,
}

/// Thread-safe map from [`InstanceKey`] to [`StoredObject`].
///
/// An instance has at most one remembered id; remembering again replaces it.
/// Removal by id or by table only touches matching entries.
///
/// Entries are never evicted on their own, so a map lives as long as the
/// unit of work that owns it. [`IdentityMap::clear`] empties it in place.
#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: RwLock<HashMap<InstanceKey, StoredObject>>,
}

impl IdentityMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `object_id` in `table` for `key`.
    pub fn remember(&self, key: InstanceKey, object_id: impl Into<String>, table: impl Into<String>) {
        let stored = StoredObject {
            object_id: object_id.into(),
            table: table.into(),
        };
        debug!(
            "remembering {} in {} for instance {}",
            stored.object_id,
            stored.table,
            key.get()
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, stored);
    }

    /// Remote id remembered for `key`.
    #[must_use]
    pub fn object_id(&self, key: InstanceKey) -> Option<String> {
        self.get(key).map(|stored| stored.object_id)
    }

    /// Full entry remembered for `key`.
    #[must_use]
    pub fn get(&self, key: InstanceKey) -> Option<StoredObject> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Forget every instance bound to `object_id`, returning how many were
    /// removed.
    pub fn remove_object_id(&self, object_id: &str) -> usize {
        self.retain(|stored| stored.object_id != object_id)
    }

    /// Forget every instance stored in `table`, returning how many were
    /// removed.
    pub fn remove_table(&self, table: &str) -> usize {
        self.retain(|stored| stored.table != table)
    }

    /// Forget every instance, returning how many were removed.
    pub fn clear(&self) -> usize {
        self.retain(|_| false)
    }

    /// Forget `key`.
    pub fn forget(&self, key: InstanceKey) -> Option<StoredObject> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
    }

    /// Number of remembered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn retain(&self, keep: impl Fn(&StoredObject) -> bool) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, stored| keep(stored));
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::sync::Arc;
    use std::thread;

    #[fixture]
    fn identities() -> IdentityMap {
        IdentityMap::new()
    }

    #[rstest]
    fn remembers_and_forgets_by_id(identities: IdentityMap) {
        let first = InstanceKey::fresh();
        let twin = InstanceKey::fresh();
        let other = InstanceKey::fresh();
        identities.remember(first, "x1", "Person");
        identities.remember(twin, "x1", "Person");
        identities.remember(other, "x2", "Person");

        assert_eq!(identities.object_id(first).as_deref(), Some("x1"));
        assert_eq!(identities.remove_object_id("x1"), 2);
        assert_eq!(identities.object_id(first), None);
        assert_eq!(identities.object_id(twin), None);
        assert_eq!(identities.object_id(other).as_deref(), Some("x2"));
    }

    #[rstest]
    fn clear_empties_the_map(identities: IdentityMap) {
        let first = InstanceKey::fresh();
        identities.remember(first, "x1", "Person");
        identities.remember(InstanceKey::fresh(), "t1", "Team");

        assert_eq!(identities.clear(), 2);
        assert!(identities.is_empty());
        assert_eq!(identities.object_id(first), None);
    }

    #[rstest]
    fn remembering_again_replaces_the_id(identities: IdentityMap) {
        let key = InstanceKey::fresh();
        identities.remember(key, "x1", "Person");
        identities.remember(key, "x9", "Person");

        assert_eq!(identities.object_id(key).as_deref(), Some("x9"));
        assert_eq!(identities.len(), 1);
    }

    #[rstest]
    fn removes_only_the_named_table(identities: IdentityMap) {
        let person = InstanceKey::fresh();
        let team = InstanceKey::fresh();
        identities.remember(person, "p1", "Person");
        identities.remember(team, "t1", "Team");

        assert_eq!(identities.remove_table("Person"), 1);
        assert_eq!(identities.object_id(person), None);
        assert_eq!(
            identities.get(team),
            Some(StoredObject {
                object_id: "t1".into(),
                table: "Team".into()
            })
        );
    }

    #[rstest]
    fn concurrent_writers_do_not_clobber_each_other(identities: IdentityMap) {
        let identities = Arc::new(identities);
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let identities = Arc::clone(&identities);
                thread::spawn(move || {
                    let key = InstanceKey::fresh();
                    identities.remember(key, format!("id-{n}"), "Person");
                    key
                })
            })
            .collect();
        let keys: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .collect();

        assert_eq!(identities.len(), keys.len());
        assert!(keys.iter().all(|key| identities.object_id(*key).is_some()));
    }
}
