//! Typed operations over registered entity kinds.

use std::marker::PhantomData;

use log::debug;
use serde_json::{Map, Value};
use tabula_core::mapper::{self, OBJECT_ID_KEY};
use tabula_core::{
    DataQueryBuilder, Entity, LoadRelationsQueryBuilder, Mapped, RequestError, Session,
};

use crate::error::PersistenceError;
use crate::store::TableStore;
use crate::transport::Transport;

/// [`TableStore`] exchanging values of `E` instead of maps.
///
/// Returned records come back as [`Mapped`] values so that skipped fields
/// stay visible to the caller.
#[derive(Debug)]
pub struct EntityStore<'a, T, E> {
    table: TableStore<'a, T>,
    kind: PhantomData<fn() -> E>,
}

impl<'a, T: Transport, E: Entity> EntityStore<'a, T, E> {
    pub(crate) const fn new(table: TableStore<'a, T>) -> Self {
        Self {
            table,
            kind: PhantomData,
        }
    }

    /// Remote table name.
    #[must_use]
    pub fn table(&self) -> &str {
        self.table.table()
    }

    fn read(&self, map: &Map<String, Value>) -> Result<Mapped<E>, PersistenceError> {
        Ok(mapper::dictionary_to::<E>(self.table.session(), map)?)
    }

    /// Create `entity`, or update it when it already has an object id.
    ///
    /// On success `entity` is bound to the stored object id and the stored
    /// record is returned.
    ///
    /// # Errors
    ///
    /// As [`TableStore::save`] and [`TableStore::update`], plus
    /// [`PersistenceError::Mapping`] when the stored record cannot be read.
    pub async fn save(&self, entity: &E) -> Result<Mapped<E>, PersistenceError> {
        let session = self.table.session();
        let map = mapper::entity_to_dictionary(session, entity);
        let stored = if map.contains_key(OBJECT_ID_KEY) {
            self.table.update(map).await?
        } else {
            self.table.save(map).await?
        };
        if let Some(object_id) = stored.get(OBJECT_ID_KEY).and_then(Value::as_str) {
            debug!("bound {} instance to {object_id}", E::KIND);
            session
                .identities()
                .remember(entity.key(), object_id, self.table());
        }
        self.read(&stored)
    }

    /// Update `entity`, which must already have an object id.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Request`] when `entity` has no object id, else as
    /// [`EntityStore::save`].
    pub async fn update(&self, entity: &E) -> Result<Mapped<E>, PersistenceError> {
        let map = mapper::entity_to_dictionary(self.table.session(), entity);
        let stored = self.table.update(map).await?;
        self.read(&stored)
    }

    /// Entities matching the query.
    ///
    /// # Errors
    ///
    /// As [`TableStore::find`], plus [`PersistenceError::Mapping`].
    pub async fn find(
        &self,
        query: Option<&DataQueryBuilder>,
    ) -> Result<Mapped<Vec<E>>, PersistenceError> {
        let maps = self.table.find(query).await?;
        read_all(self.table.session(), maps)
    }

    /// First entity by creation order.
    ///
    /// # Errors
    ///
    /// As [`TableStore::find_first`], plus [`PersistenceError::Mapping`].
    pub async fn find_first(
        &self,
        query: Option<&DataQueryBuilder>,
    ) -> Result<Mapped<E>, PersistenceError> {
        let map = self.table.find_first(query).await?;
        self.read(&map)
    }

    /// Last entity by creation order.
    ///
    /// # Errors
    ///
    /// As [`TableStore::find_last`], plus [`PersistenceError::Mapping`].
    pub async fn find_last(
        &self,
        query: Option<&DataQueryBuilder>,
    ) -> Result<Mapped<E>, PersistenceError> {
        let map = self.table.find_last(query).await?;
        self.read(&map)
    }

    /// Entity with the given object id.
    ///
    /// # Errors
    ///
    /// As [`TableStore::find_by_id`], plus [`PersistenceError::Mapping`].
    pub async fn find_by_id(
        &self,
        object_id: &str,
        query: Option<&DataQueryBuilder>,
    ) -> Result<Mapped<E>, PersistenceError> {
        let map = self.table.find_by_id(object_id, query).await?;
        self.read(&map)
    }

    /// Delete `entity`; returns the deletion time.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Request`] when `entity` has no object id, else as
    /// [`TableStore::remove_by_id`].
    pub async fn remove(&self, entity: &E) -> Result<i64, PersistenceError> {
        let object_id = self.object_id(entity)?;
        self.table.remove_by_id(&object_id).await
    }

    /// One page of `parent`'s children in the relation named by `query`.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Request`] when `parent` has no object id, else as
    /// [`TableStore::load_relations`], plus [`PersistenceError::Mapping`].
    pub async fn load_relations<R: Entity>(
        &self,
        parent: &E,
        query: &LoadRelationsQueryBuilder,
    ) -> Result<Mapped<Vec<R>>, PersistenceError> {
        let object_id = self.object_id(parent)?;
        let maps = self.table.load_relations(&object_id, query).await?;
        read_all(self.table.session(), maps)
    }

    fn object_id(&self, entity: &E) -> Result<String, PersistenceError> {
        mapper::object_id(self.table.session(), entity)
            .ok_or(PersistenceError::Request(RequestError::MissingObjectId))
    }
}

/// Read every map as an `R`, pooling the issues with those of the listing.
fn read_all<R: Entity>(
    session: &Session,
    maps: Mapped<Vec<Map<String, Value>>>,
) -> Result<Mapped<Vec<R>>, PersistenceError> {
    let Mapped {
        value: maps,
        mut issues,
    } = maps;
    let mut values = Vec::with_capacity(maps.len());
    for map in &maps {
        let mapped = mapper::dictionary_to::<R>(session, map)?;
        values.push(mapped.value);
        issues.extend(mapped.issues);
    }
    Ok(Mapped {
        value: values,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::DataStore;
    use crate::test_support::StubTransport;
    use rstest::rstest;
    use serde_json::json;
    use tabula_core::HttpMethod;
    use tabula_core::test_support::{Person, Team, sample_session};

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime should build")
            .block_on(future)
    }

    #[rstest]
    fn save_creates_then_updates() {
        let transport = StubTransport::new()
            .with_json(200, json!({"objectId": "p1", "name": "Ada", "years": 36}))
            .with_json(200, json!({"objectId": "p1", "name": "Ada", "years": 37}));
        let store = DataStore::new(transport, Arc::new(sample_session()));
        let people = store.of::<Person>();
        let mut ada = Person::new("Ada", 36);

        let created = block_on(people.save(&ada)).expect("create");
        assert!(created.is_clean());
        assert_eq!(created.value.age, Some(36));
        assert_eq!(
            mapper::object_id(store.session(), &ada).as_deref(),
            Some("p1")
        );

        ada.age = Some(37);
        let updated = block_on(people.save(&ada)).expect("update");
        assert_eq!(updated.value.age, Some(37));

        let requests = store.transport().requests();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].path, "data/Person");
        assert_eq!(requests[0].body, Some(json!({"name": "Ada", "years": 36})));
        assert_eq!(requests[1].method, HttpMethod::Put);
        assert_eq!(requests[1].path, "data/Person/p1");
        assert_eq!(
            requests[1].body,
            Some(json!({"objectId": "p1", "name": "Ada", "years": 37}))
        );
    }

    #[rstest]
    fn find_collects_issues_across_records() {
        let transport = StubTransport::new().with_json(
            200,
            json!([
                {"objectId": "p1", "name": "Ada", "years": 36},
                {"objectId": "p2", "name": "Bob", "years": "old"}
            ]),
        );
        let store = DataStore::new(transport, Arc::new(sample_session()));

        let found = block_on(store.of::<Person>().find(None)).expect("find");

        assert_eq!(found.value.len(), 2);
        assert_eq!(found.value[1].name.as_deref(), Some("Bob"));
        assert_eq!(found.value[1].age, None);
        assert_eq!(found.issues.len(), 1);
        assert_eq!(found.issues[0].field, "years");
    }

    #[rstest]
    fn find_keeps_listing_issues() {
        let transport = StubTransport::new().with_json(
            200,
            json!(["stray", {"objectId": "p1", "name": "Ada", "years": 36}]),
        );
        let store = DataStore::new(transport, Arc::new(sample_session()));

        let found = block_on(store.of::<Person>().find(None)).expect("find");

        assert_eq!(found.value.len(), 1);
        assert_eq!(found.issues.len(), 1);
        assert_eq!(found.issues[0].field, "[0]");
        assert!(matches!(
            found.issues[0].error,
            tabula_core::MappingError::NotAnObject { found: "a string" }
        ));
    }

    #[rstest]
    fn remove_without_object_id_is_refused() {
        let store = DataStore::new(StubTransport::new(), Arc::new(sample_session()));
        let err = block_on(store.of::<Person>().remove(&Person::new("Ada", 36)))
            .expect_err("remove should be refused");
        assert!(matches!(
            err,
            PersistenceError::Request(RequestError::MissingObjectId)
        ));
        assert!(store.transport().requests().is_empty());
    }

    #[rstest]
    fn remove_forgets_the_entity() {
        let transport = StubTransport::new()
            .with_json(200, json!({"objectId": "p1", "name": "Ada", "years": 36}))
            .with_json(200, json!({"deletionTime": 5}));
        let store = DataStore::new(transport, Arc::new(sample_session()));
        let people = store.of::<Person>();
        let found = block_on(people.find_by_id("p1", None)).expect("find by id");

        let deleted = block_on(people.remove(&found.value)).expect("remove");

        assert_eq!(deleted, 5);
        assert_eq!(mapper::object_id(store.session(), &found.value), None);
        let request = store.transport().last_request().expect("request sent");
        assert_eq!(request.path, "data/Person/p1");
    }

    #[rstest]
    fn load_relations_reads_children() {
        let transport = StubTransport::new()
            .with_json(200, json!({"objectId": "t1", "title": "Crew"}))
            .with_json(
                200,
                json!([
                    {"___class": "Person", "objectId": "p1", "name": "Grace"},
                    {"___class": "Person", "objectId": "p2", "name": "Linus"}
                ]),
            );
        let store = DataStore::new(transport, Arc::new(sample_session()));
        let teams = store.of::<Team>();
        let crew = block_on(teams.find_first(None)).expect("find first");

        let query = LoadRelationsQueryBuilder::new("members");
        let members = block_on(teams.load_relations::<Person>(&crew.value, &query))
            .expect("load relations");

        let names: Vec<_> = members
            .value
            .iter()
            .filter_map(|person| person.name.as_deref())
            .collect();
        assert_eq!(names, ["Grace", "Linus"]);
        let request = store.transport().last_request().expect("request sent");
        assert_eq!(request.path, "data/Team/t1/members");
    }
}
