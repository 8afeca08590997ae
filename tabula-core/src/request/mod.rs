//! Shapes REST requests for each data operation.
//!
//! [`RequestShaper`] turns a table name, identifiers, entity maps and query
//! builders into [`RestRequest`] values. It performs no I/O; sending the
//! request and classifying the response is left to a transport.

use std::fmt;

use serde_json::{Map, Value, json};

use crate::entity::{USER_CLASS, USERS_TABLE};
use crate::mapper::OBJECT_ID_KEY;
use crate::query::{
    DEFAULT_OFFSET, DEFAULT_RELATIONS_PAGE_SIZE, DataQueryBuilder, LoadRelationsQueryBuilder,
};

mod encoding;
mod error;

pub use encoding::encode_query_value;
pub use error::RequestError;

use encoding::join_list;

/// Clause used when a bulk or relation operation names no where-clause.
pub const DEFAULT_WHERE_CLAUSE: &str = "objectId != NULL";

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a relation update treats existing children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationVerb {
    /// Replace the children (`PUT`).
    Set,
    /// Append to the children (`POST`).
    Add,
}

impl RelationVerb {
    /// HTTP verb for this update.
    #[must_use]
    pub const fn method(self) -> HttpMethod {
        match self {
            Self::Set => HttpMethod::Put,
            Self::Add => HttpMethod::Post,
        }
    }
}

/// Children addressed by a relation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationTarget<'a> {
    /// Explicit child object ids, sent as the body.
    Ids(&'a [String]),
    /// Children matching a where-clause, sent in the query string.
    Where(Option<&'a str>),
}

/// A request ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    /// Verb.
    pub method: HttpMethod,
    /// Path relative to the service base URL, including any query string.
    pub path: String,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl RestRequest {
    fn new(method: HttpMethod, path: String) -> Self {
        Self {
            method,
            path,
            body: None,
        }
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Builds requests against one table.
///
/// # Examples
///
/// ```
/// use tabula_core::request::{HttpMethod, RequestShaper};
///
/// let shaper = RequestShaper::new("BackendlessUser");
/// let request = shaper.describe();
/// assert_eq!(request.method, HttpMethod::Get);
/// assert_eq!(request.path, "data/Users/properties");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestShaper {
    table: String,
}

impl RequestShaper {
    /// Shape requests for `table`. The user class name is replaced by the
    /// `Users` table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        let table = if table == USER_CLASS {
            USERS_TABLE.to_owned()
        } else {
            table
        };
        Self { table }
    }

    /// Table the requests address.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    fn table_path(&self) -> String {
        format!("data/{}", self.table)
    }

    /// `GET data/{table}/properties`
    #[must_use]
    pub fn describe(&self) -> RestRequest {
        RestRequest::new(HttpMethod::Get, format!("{}/properties", self.table_path()))
    }

    /// `POST data/{table}` with the entity map.
    #[must_use]
    pub fn save(&self, entity: Map<String, Value>) -> RestRequest {
        RestRequest::new(HttpMethod::Post, self.table_path()).with_body(Value::Object(entity))
    }

    /// `POST data/bulk/{table}` with an array of entity maps.
    #[must_use]
    pub fn create_bulk(&self, entities: Vec<Map<String, Value>>) -> RestRequest {
        RestRequest::new(HttpMethod::Post, format!("data/bulk/{}", self.table)).with_body(
            Value::Array(entities.into_iter().map(Value::Object).collect()),
        )
    }

    /// `PUT data/{table}/{objectId}` with the entity map.
    ///
    /// # Errors
    ///
    /// [`RequestError::MissingObjectId`] when the map has no string `objectId`.
    pub fn update(&self, entity: Map<String, Value>) -> Result<RestRequest, RequestError> {
        let object_id = entity
            .get(OBJECT_ID_KEY)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(RequestError::MissingObjectId)?;
        let path = format!("{}/{object_id}", self.table_path());
        Ok(RestRequest::new(HttpMethod::Put, path).with_body(Value::Object(entity)))
    }

    /// `PUT data/bulk/{table}[?where=]` with the changes map. The where-clause
    /// is only sent when non-empty.
    #[must_use]
    pub fn update_bulk(&self, where_clause: Option<&str>, changes: Map<String, Value>) -> RestRequest {
        let mut path = format!("data/bulk/{}", self.table);
        if let Some(clause) = where_clause.filter(|clause| !clause.is_empty()) {
            path.push_str("?where=");
            path.push_str(&encode_query_value(clause));
        }
        RestRequest::new(HttpMethod::Put, path).with_body(Value::Object(changes))
    }

    /// `DELETE data/{table}/{objectId}`
    ///
    /// # Errors
    ///
    /// [`RequestError::EmptySegment`] for an empty id.
    pub fn remove_by_id(&self, object_id: &str) -> Result<RestRequest, RequestError> {
        let object_id = non_empty(object_id, "object id")?;
        Ok(RestRequest::new(
            HttpMethod::Delete,
            format!("{}/{object_id}", self.table_path()),
        ))
    }

    /// `POST data/bulk/{table}/delete` with `{"where": clause}`.
    ///
    /// An absent clause deletes every row.
    #[must_use]
    pub fn remove_bulk(&self, where_clause: Option<&str>) -> RestRequest {
        let clause = where_clause.unwrap_or(DEFAULT_WHERE_CLAUSE);
        RestRequest::new(HttpMethod::Post, format!("data/bulk/{}/delete", self.table))
            .with_body(json!({ "where": clause }))
    }

    /// `GET data/{table}/count[?where=]`
    #[must_use]
    pub fn count(&self, query: Option<&DataQueryBuilder>) -> RestRequest {
        let mut path = format!("{}/count", self.table_path());
        if let Some(clause) = query
            .and_then(DataQueryBuilder::where_clause)
            .filter(|clause| !clause.is_empty())
        {
            path.push_str("?where=");
            path.push_str(&encode_query_value(clause));
        }
        RestRequest::new(HttpMethod::Get, path)
    }

    /// `POST data/{table}/find` with the query's parameters.
    #[must_use]
    pub fn find(&self, query: Option<&DataQueryBuilder>) -> RestRequest {
        let parameters = query.map(find_parameters).unwrap_or_default();
        RestRequest::new(HttpMethod::Post, format!("{}/find", self.table_path()))
            .with_body(Value::Object(parameters))
    }

    /// `GET data/{table}/first` plus the relation query.
    #[must_use]
    pub fn find_first(&self, query: Option<&DataQueryBuilder>) -> RestRequest {
        self.single(format!("{}/first", self.table_path()), query)
    }

    /// `GET data/{table}/last` plus the relation query.
    #[must_use]
    pub fn find_last(&self, query: Option<&DataQueryBuilder>) -> RestRequest {
        self.single(format!("{}/last", self.table_path()), query)
    }

    /// `GET data/{table}/{objectId}` plus the relation query.
    ///
    /// # Errors
    ///
    /// [`RequestError::EmptySegment`] for an empty id.
    pub fn find_by_id(
        &self,
        object_id: &str,
        query: Option<&DataQueryBuilder>,
    ) -> Result<RestRequest, RequestError> {
        let object_id = non_empty(object_id, "object id")?;
        Ok(self.single(format!("{}/{object_id}", self.table_path()), query))
    }

    fn single(&self, mut path: String, query: Option<&DataQueryBuilder>) -> RestRequest {
        path.push_str(&relation_query(query));
        RestRequest::new(HttpMethod::Get, path)
    }

    /// Replace the children of `column` on `parent_id` (`PUT`).
    ///
    /// # Errors
    ///
    /// As [`RequestShaper::relation`].
    pub fn set_relation(
        &self,
        column: &str,
        parent_id: &str,
        target: RelationTarget<'_>,
    ) -> Result<RestRequest, RequestError> {
        self.relation(RelationVerb::Set, column, parent_id, target)
    }

    /// Append children to `column` on `parent_id` (`POST`).
    ///
    /// # Errors
    ///
    /// As [`RequestShaper::relation`].
    pub fn add_relation(
        &self,
        column: &str,
        parent_id: &str,
        target: RelationTarget<'_>,
    ) -> Result<RestRequest, RequestError> {
        self.relation(RelationVerb::Add, column, parent_id, target)
    }

    /// `PUT`/`POST data/{table}/{parent}/{column}`.
    ///
    /// Explicit ids travel as the body. A where target is sent as
    /// `?whereClause=`, defaulting to [`DEFAULT_WHERE_CLAUSE`] when absent or
    /// empty.
    ///
    /// # Errors
    ///
    /// [`RequestError::EmptySegment`] when the column or parent id is empty.
    pub fn relation(
        &self,
        verb: RelationVerb,
        column: &str,
        parent_id: &str,
        target: RelationTarget<'_>,
    ) -> Result<RestRequest, RequestError> {
        let target = match target {
            RelationTarget::Where(clause) => {
                RelationTarget::Where(clause.filter(|clause| !clause.is_empty()))
            }
            ids => ids,
        };
        self.relation_request(verb.method(), column, parent_id, target)
    }

    /// `DELETE data/{table}/{parent}/{column}`.
    ///
    /// Explicit ids travel as the body. A where target is sent as
    /// `?whereClause=`, defaulting to [`DEFAULT_WHERE_CLAUSE`] when absent.
    ///
    /// # Errors
    ///
    /// [`RequestError::EmptySegment`] when the column or parent id is empty.
    pub fn delete_relation(
        &self,
        column: &str,
        parent_id: &str,
        target: RelationTarget<'_>,
    ) -> Result<RestRequest, RequestError> {
        self.relation_request(HttpMethod::Delete, column, parent_id, target)
    }

    fn relation_request(
        &self,
        method: HttpMethod,
        column: &str,
        parent_id: &str,
        target: RelationTarget<'_>,
    ) -> Result<RestRequest, RequestError> {
        let parent_id = non_empty(parent_id, "parent object id")?;
        let column = non_empty(column, "relation column")?;
        let path = format!("{}/{parent_id}/{column}", self.table_path());
        Ok(match target {
            RelationTarget::Ids(children) => {
                RestRequest::new(method, path).with_body(Value::from(children.to_vec()))
            }
            RelationTarget::Where(clause) => {
                let clause = clause.unwrap_or(DEFAULT_WHERE_CLAUSE);
                RestRequest::new(
                    method,
                    format!("{path}?whereClause={}", encode_query_value(clause)),
                )
            }
        })
    }

    /// `GET data/{table}/{objectId}/{relation}[?pageSize=&offset=]`.
    ///
    /// Each paging parameter is sent only when it differs from the service
    /// default.
    ///
    /// # Errors
    ///
    /// [`RequestError::EmptySegment`] when the id or relation name is empty.
    pub fn load_relations(
        &self,
        object_id: &str,
        query: &LoadRelationsQueryBuilder,
    ) -> Result<RestRequest, RequestError> {
        let object_id = non_empty(object_id, "object id")?;
        let relation = non_empty(query.relation_name(), "relation name")?;
        let mut parameters = Vec::with_capacity(2);
        if query.page_size() != DEFAULT_RELATIONS_PAGE_SIZE {
            parameters.push(format!("pageSize={}", query.page_size()));
        }
        if query.offset() != DEFAULT_OFFSET {
            parameters.push(format!("offset={}", query.offset()));
        }
        let mut path = format!("{}/{object_id}/{relation}", self.table_path());
        if !parameters.is_empty() {
            path.push('?');
            path.push_str(&parameters.join("&"));
        }
        Ok(RestRequest::new(HttpMethod::Get, path))
    }
}

/// Body parameters of a `find` request: only options that are present.
#[must_use]
pub fn find_parameters(query: &DataQueryBuilder) -> Map<String, Value> {
    let mut parameters = Map::new();
    if let Some(clause) = query.where_clause() {
        parameters.insert("where".into(), Value::from(clause));
    }
    if let Some(depth) = query.relations_depth() {
        parameters.insert("relationsDepth".into(), Value::from(depth.to_string()));
    }
    if let Some(sort_by) = query.sort_by().filter(|columns| !columns.is_empty()) {
        parameters.insert("sortBy".into(), Value::from(join_list(sort_by)));
    }
    if let Some(related) = query.related() {
        parameters.insert("loadRelations".into(), Value::from(join_list(related)));
    }
    if let Some(group_by) = query.group_by() {
        parameters.insert("groupBy".into(), Value::from(join_list(group_by)));
    }
    if let Some(having) = query.having_clause() {
        parameters.insert("having".into(), Value::from(having));
    }
    if let Some(page_size) = query.page_size() {
        parameters.insert("pageSize".into(), Value::from(page_size));
    }
    if let Some(offset) = query.offset() {
        parameters.insert("offset".into(), Value::from(offset));
    }
    parameters
}

/// Query string for single-object lookups.
fn relation_query(query: Option<&DataQueryBuilder>) -> String {
    let related = query.and_then(DataQueryBuilder::related);
    let depth = query
        .and_then(DataQueryBuilder::relations_depth)
        .filter(|depth| *depth > 0);
    match (related, depth) {
        (Some(related), Some(depth)) => format!(
            "?loadRelations={}&relationsDepth={depth}",
            encode_query_value(&join_list(related))
        ),
        (Some(related), None) => {
            format!("?loadRelations={}", encode_query_value(&join_list(related)))
        }
        (None, Some(depth)) => format!("?relationsDepth={depth}"),
        (None, None) => String::new(),
    }
}

fn non_empty<'a>(value: &'a str, segment: &'static str) -> Result<&'a str, RequestError> {
    if value.is_empty() {
        Err(RequestError::EmptySegment { segment })
    } else {
        Ok(value)
    }
}
