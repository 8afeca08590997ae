//! Query builders read by the request shaper.
//!
//! Both builders are plain configuration values. Absent options are left out
//! of requests entirely rather than sent as defaults.

use serde::{Deserialize, Serialize};

/// Page size assumed by the service for relation loads.
pub const DEFAULT_RELATIONS_PAGE_SIZE: u32 = 100;
/// Offset assumed by the service for relation loads.
pub const DEFAULT_OFFSET: u32 = 0;

/// Options for `find`, `count` and single-object lookups.
///
/// # Examples
///
/// ```
/// use tabula_core::DataQueryBuilder;
///
/// let query = DataQueryBuilder::new()
///     .with_where_clause("age > 5")
///     .add_sort_by("name")
///     .with_page_size(20);
/// assert_eq!(query.where_clause(), Some("age > 5"));
/// assert_eq!(query.sort_by(), Some(&["name".to_owned()][..]));
/// assert_eq!(query.offset(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQueryBuilder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    where_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sort_by: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    related: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relations_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_by: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    having_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<u32>,
}

impl DataQueryBuilder {
    /// Query with no options set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter rows with a where-clause.
    #[must_use]
    pub fn with_where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Replace the sort order.
    #[must_use]
    pub fn with_sort_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_by = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Append a sort column.
    #[must_use]
    pub fn add_sort_by(mut self, column: impl Into<String>) -> Self {
        self.sort_by.get_or_insert_with(Vec::new).push(column.into());
        self
    }

    /// Replace the relations to load.
    #[must_use]
    pub fn with_related<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related = Some(relations.into_iter().map(Into::into).collect());
        self
    }

    /// Append a relation to load.
    #[must_use]
    pub fn add_related(mut self, relation: impl Into<String>) -> Self {
        self.related.get_or_insert_with(Vec::new).push(relation.into());
        self
    }

    /// Load relations this many levels deep.
    #[must_use]
    pub fn with_relations_depth(mut self, depth: u32) -> Self {
        self.relations_depth = Some(depth);
        self
    }

    /// Replace the grouping columns.
    #[must_use]
    pub fn with_group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Append a grouping column.
    #[must_use]
    pub fn add_group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.get_or_insert_with(Vec::new).push(column.into());
        self
    }

    /// Filter groups with a having-clause.
    #[must_use]
    pub fn with_having_clause(mut self, clause: impl Into<String>) -> Self {
        self.having_clause = Some(clause.into());
        self
    }

    /// Limit the number of rows returned.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Skip this many rows.
    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Where-clause.
    #[must_use]
    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    /// Sort columns.
    #[must_use]
    pub fn sort_by(&self) -> Option<&[String]> {
        self.sort_by.as_deref()
    }

    /// Relations to load.
    #[must_use]
    pub fn related(&self) -> Option<&[String]> {
        self.related.as_deref()
    }

    /// Relation depth.
    #[must_use]
    pub fn relations_depth(&self) -> Option<u32> {
        self.relations_depth
    }

    /// Grouping columns.
    #[must_use]
    pub fn group_by(&self) -> Option<&[String]> {
        self.group_by.as_deref()
    }

    /// Having-clause.
    #[must_use]
    pub fn having_clause(&self) -> Option<&str> {
        self.having_clause.as_deref()
    }

    /// Page size.
    #[must_use]
    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    /// Offset.
    #[must_use]
    pub fn offset(&self) -> Option<u32> {
        self.offset
    }
}

/// Options for loading one relation of an object, page by page.
///
/// # Examples
///
/// ```
/// use tabula_core::LoadRelationsQueryBuilder;
///
/// let mut query = LoadRelationsQueryBuilder::new("members").with_page_size(25);
/// query.prepare_next_page();
/// assert_eq!(query.offset(), 25);
/// query.prepare_previous_page();
/// query.prepare_previous_page();
/// assert_eq!(query.offset(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRelationsQueryBuilder {
    relation_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sort_by: Option<Vec<String>>,
    #[serde(default = "default_page_size")]
    page_size: u32,
    #[serde(default)]
    offset: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_RELATIONS_PAGE_SIZE
}

impl LoadRelationsQueryBuilder {
    /// Load `relation_name` with the service's default paging.
    #[must_use]
    pub fn new(relation_name: impl Into<String>) -> Self {
        Self {
            relation_name: relation_name.into(),
            properties: None,
            sort_by: None,
            page_size: DEFAULT_RELATIONS_PAGE_SIZE,
            offset: DEFAULT_OFFSET,
        }
    }

    /// Set the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the offset.
    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Append a property to return for each related object.
    #[must_use]
    pub fn add_property(mut self, property: impl Into<String>) -> Self {
        self.properties
            .get_or_insert_with(Vec::new)
            .push(property.into());
        self
    }

    /// Append a sort column.
    #[must_use]
    pub fn add_sort_by(mut self, column: impl Into<String>) -> Self {
        self.sort_by.get_or_insert_with(Vec::new).push(column.into());
        self
    }

    /// Advance the offset by one page.
    pub fn prepare_next_page(&mut self) {
        self.offset = self.offset.saturating_add(self.page_size);
    }

    /// Move the offset back one page, stopping at zero.
    pub fn prepare_previous_page(&mut self) {
        self.offset = self.offset.saturating_sub(self.page_size);
    }

    /// Relation column.
    #[must_use]
    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    /// Requested properties.
    #[must_use]
    pub fn properties(&self) -> Option<&[String]> {
        self.properties.as_deref()
    }

    /// Sort columns.
    #[must_use]
    pub fn sort_by(&self) -> Option<&[String]> {
        self.sort_by.as_deref()
    }

    /// Page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Offset.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }
}
