//! Table schema records returned by `describe`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One column of a remote table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectProperty {
    /// Column name.
    pub name: String,
    /// Service data type, e.g. `STRING`, `INT`, `DATA_REF`.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Whether a value is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Value used when none is supplied.
    #[serde(default)]
    pub default_value: Option<Value>,
    /// Target table of a relation column.
    #[serde(default)]
    pub related_table: Option<String>,
    /// Validation pattern.
    #[serde(default)]
    pub custom_regex: Option<String>,
    /// Whether the relation is loaded with its parent.
    #[serde(default)]
    pub auto_load: bool,
    /// Whether this is the primary key.
    #[serde(default, rename = "isPrimaryKey")]
    pub primary_key: bool,
}
