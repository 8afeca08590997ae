//! Table-level data store.
//!
//! [`DataStore`] pairs a [`Transport`] with a shared [`Session`]. Each
//! [`TableStore`] operation shapes one request, sends it, classifies the
//! response and keeps the session's identity map consistent with what the
//! service reported.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::{Map, Value};
use tabula_core::mapper::table_name;
use tabula_core::{
    DataQueryBuilder, Entity, LoadRelationsQueryBuilder, Mapped, MappingError, MappingIssue,
    RelationTarget, RequestShaper, RestRequest, Session,
};

use crate::classify::{classify, decode_count, decode_deletion};
use crate::describe::ObjectProperty;
use crate::entities::EntityStore;
use crate::error::PersistenceError;
use crate::transport::{RawResponse, Transport};

/// Entry point for data operations.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use serde_json::json;
/// use tabula_core::Session;
/// use tabula_http::DataStore;
/// use tabula_http::test_support::StubTransport;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let transport = StubTransport::new().with_body(200, "3");
/// let store = DataStore::new(transport, Arc::new(Session::default()));
/// assert_eq!(store.table("Person").count(None).await.unwrap(), 3);
/// assert_eq!(store.transport().requests()[0].path, "data/Person/count");
/// # });
/// ```
#[derive(Debug)]
pub struct DataStore<T> {
    transport: T,
    session: Arc<Session>,
}

impl<T: Transport> DataStore<T> {
    /// Store sending through `transport` and mapping with `session`.
    pub const fn new(transport: T, session: Arc<Session>) -> Self {
        Self { transport, session }
    }

    /// Shared session.
    #[must_use]
    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Operations on one table. `BackendlessUser` addresses `Users`.
    pub fn table(&self, table: impl Into<String>) -> TableStore<'_, T> {
        TableStore {
            store: self,
            shaper: RequestShaper::new(table),
        }
    }

    /// Typed operations on the table of `E`.
    #[must_use]
    pub fn of<E: Entity>(&self) -> EntityStore<'_, T, E> {
        EntityStore::new(self.table(table_name(E::KIND)))
    }
}

/// Operations on one table, exchanging JSON maps.
#[derive(Debug)]
pub struct TableStore<'a, T> {
    store: &'a DataStore<T>,
    shaper: RequestShaper,
}

impl<'a, T: Transport> TableStore<'a, T> {
    /// Remote table name.
    #[must_use]
    pub fn table(&self) -> &str {
        self.shaper.table()
    }

    /// Shared session.
    #[must_use]
    pub fn session(&self) -> &'a Session {
        &self.store.session
    }

    async fn send(&self, request: RestRequest) -> Result<RawResponse, PersistenceError> {
        debug!("{} {} on {}", request.method, request.path, self.table());
        Ok(self.store.transport.execute(&request).await?)
    }

    fn forget_table(&self) {
        let forgotten = self.session().identities().remove_table(self.table());
        debug!("forgot {forgotten} object ids of {}", self.table());
    }

    /// Column schema of the table.
    ///
    /// # Errors
    ///
    /// [`PersistenceError`] on transport failure, fault or undecodable body.
    pub async fn describe(&self) -> Result<Vec<ObjectProperty>, PersistenceError> {
        let raw = self.send(self.shaper.describe()).await?;
        classify(&raw)
    }

    /// Create one object; returns it as stored.
    ///
    /// # Errors
    ///
    /// As [`TableStore::describe`].
    pub async fn save(&self, entity: Map<String, Value>) -> Result<Map<String, Value>, PersistenceError> {
        let raw = self.send(self.shaper.save(entity)).await?;
        classify(&raw)
    }

    /// Create several objects; returns their object ids.
    ///
    /// # Errors
    ///
    /// As [`TableStore::describe`].
    pub async fn create_bulk(
        &self,
        entities: Vec<Map<String, Value>>,
    ) -> Result<Vec<String>, PersistenceError> {
        let raw = self.send(self.shaper.create_bulk(entities)).await?;
        classify(&raw)
    }

    /// Update one object identified by its `objectId`.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Request`] when the map has no `objectId`, else as
    /// [`TableStore::describe`].
    pub async fn update(&self, entity: Map<String, Value>) -> Result<Map<String, Value>, PersistenceError> {
        let raw = self.send(self.shaper.update(entity)?).await?;
        classify(&raw)
    }

    /// Apply `changes` to every object matching `where_clause`; returns the
    /// number updated.
    ///
    /// # Errors
    ///
    /// As [`TableStore::describe`], with count decoding.
    pub async fn update_bulk(
        &self,
        where_clause: Option<&str>,
        changes: Map<String, Value>,
    ) -> Result<i64, PersistenceError> {
        let raw = self.send(self.shaper.update_bulk(where_clause, changes)).await?;
        decode_count(&raw)
    }

    /// Delete one object; returns the deletion time. The id is forgotten.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Request`] for an empty id,
    /// [`PersistenceError::UnexpectedPayload`] when the body carries no
    /// integer, else as [`TableStore::describe`].
    pub async fn remove_by_id(&self, object_id: &str) -> Result<i64, PersistenceError> {
        let raw = self.send(self.shaper.remove_by_id(object_id)?).await?;
        let deleted = decode_deletion(&raw)?;
        self.session().identities().remove_object_id(object_id);
        Ok(deleted)
    }

    /// Delete every object matching `where_clause`; returns the number
    /// deleted. Every id of the table is forgotten.
    ///
    /// # Errors
    ///
    /// As [`TableStore::update_bulk`].
    pub async fn remove_bulk(&self, where_clause: Option<&str>) -> Result<i64, PersistenceError> {
        let raw = self.send(self.shaper.remove_bulk(where_clause)).await?;
        let removed = decode_count(&raw)?;
        self.forget_table();
        Ok(removed)
    }

    /// Number of objects matching the query's where clause.
    ///
    /// # Errors
    ///
    /// As [`TableStore::update_bulk`].
    pub async fn count(&self, query: Option<&DataQueryBuilder>) -> Result<i64, PersistenceError> {
        let raw = self.send(self.shaper.count(query)).await?;
        decode_count(&raw)
    }

    /// Objects matching the query. Elements that are not objects are
    /// skipped and reported as issues under their index.
    ///
    /// # Errors
    ///
    /// As [`TableStore::describe`].
    pub async fn find(
        &self,
        query: Option<&DataQueryBuilder>,
    ) -> Result<Mapped<Vec<Map<String, Value>>>, PersistenceError> {
        let raw = self.send(self.shaper.find(query)).await?;
        Ok(objects(self.table(), classify(&raw)?))
    }

    /// First object by creation order.
    ///
    /// # Errors
    ///
    /// As [`TableStore::describe`].
    pub async fn find_first(
        &self,
        query: Option<&DataQueryBuilder>,
    ) -> Result<Map<String, Value>, PersistenceError> {
        let raw = self.send(self.shaper.find_first(query)).await?;
        classify(&raw)
    }

    /// Last object by creation order.
    ///
    /// # Errors
    ///
    /// As [`TableStore::describe`].
    pub async fn find_last(
        &self,
        query: Option<&DataQueryBuilder>,
    ) -> Result<Map<String, Value>, PersistenceError> {
        let raw = self.send(self.shaper.find_last(query)).await?;
        classify(&raw)
    }

    /// Object with the given id.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Request`] for an empty id, else as
    /// [`TableStore::describe`].
    pub async fn find_by_id(
        &self,
        object_id: &str,
        query: Option<&DataQueryBuilder>,
    ) -> Result<Map<String, Value>, PersistenceError> {
        let raw = self.send(self.shaper.find_by_id(object_id, query)?).await?;
        classify(&raw)
    }

    /// Replace the children of `column`; returns the number related.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Request`] for an empty column or parent id, else
    /// as [`TableStore::update_bulk`].
    pub async fn set_relation(
        &self,
        column: &str,
        parent_id: &str,
        target: RelationTarget<'_>,
    ) -> Result<i64, PersistenceError> {
        let request = self.shaper.set_relation(column, parent_id, target)?;
        self.relation_count(request).await
    }

    /// Append children to `column`; returns the number related.
    ///
    /// # Errors
    ///
    /// As [`TableStore::set_relation`].
    pub async fn add_relation(
        &self,
        column: &str,
        parent_id: &str,
        target: RelationTarget<'_>,
    ) -> Result<i64, PersistenceError> {
        let request = self.shaper.add_relation(column, parent_id, target)?;
        self.relation_count(request).await
    }

    /// Remove children from `column`; returns the number unrelated.
    ///
    /// # Errors
    ///
    /// As [`TableStore::set_relation`].
    pub async fn delete_relation(
        &self,
        column: &str,
        parent_id: &str,
        target: RelationTarget<'_>,
    ) -> Result<i64, PersistenceError> {
        let request = self.shaper.delete_relation(column, parent_id, target)?;
        self.relation_count(request).await
    }

    async fn relation_count(&self, request: RestRequest) -> Result<i64, PersistenceError> {
        let raw = self.send(request).await?;
        let related = decode_count(&raw)?;
        self.forget_table();
        Ok(related)
    }

    /// One page of the children in `query`'s relation.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Request`] for an empty id or relation name, else
    /// as [`TableStore::find`].
    pub async fn load_relations(
        &self,
        object_id: &str,
        query: &LoadRelationsQueryBuilder,
    ) -> Result<Mapped<Vec<Map<String, Value>>>, PersistenceError> {
        let raw = self.send(self.shaper.load_relations(object_id, query)?).await?;
        Ok(objects(self.table(), classify(&raw)?))
    }
}

/// Split a list response into its objects and the elements that were not.
fn objects(table: &str, elements: Vec<Value>) -> Mapped<Vec<Map<String, Value>>> {
    let mut maps = Vec::with_capacity(elements.len());
    let mut issues = Vec::new();
    for (index, element) in elements.into_iter().enumerate() {
        match element {
            Value::Object(map) => maps.push(map),
            other => {
                let error = MappingError::NotAnObject {
                    found: json_type(&other),
                };
                warn!("skipping element {index} of {table} response: {error}");
                issues.push(MappingIssue {
                    field: format!("[{index}]"),
                    error,
                });
            }
        }
    }
    Mapped {
        value: maps,
        issues,
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
