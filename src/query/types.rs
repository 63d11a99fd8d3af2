//! Persisted query types
//!
//! The JSON shape exchanged with the hosting editor and stored as panel
//! configuration. Part semantics are resolved through the
//! [`PartRegistry`](crate::query::PartRegistry), keyed by `SelectItem::kind`.
//!
//! # Example
//!
//! ```json
//! {
//!   "table": "cpu",
//!   "select": [[{"type": "field", "params": ["value"]}, {"type": "avg", "params": []}]],
//!   "groupBy": [{"type": "time", "params": ["$__interval"]}, {"type": "fill", "params": ["null"]}],
//!   "tags": [{"key": "host", "value": "server1"}],
//!   "orderByTime": "ASC"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A part parameter or limit: either a string or a JSON number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    /// JavaScript-style truthiness: empty strings and zero are unset
    pub fn is_set(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

/// One persisted part: `{type, params}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    /// Part type name, resolved through the registry
    #[serde(rename = "type")]
    pub kind: String,
    /// Positional parameters. `None` when the key is absent, in which case
    /// the registry fills the definition's defaults; an explicit empty list
    /// is kept as is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Scalar>>,
}

impl SelectItem {
    /// Create a part from a type name and parameters
    pub fn new(kind: impl Into<String>, params: Vec<Scalar>) -> Self {
        Self {
            kind: kind.into(),
            params: Some(params),
        }
    }

    /// A part without a `params` key, resolved with the definition's defaults
    pub fn bare(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: None,
        }
    }

    /// A `field` reference
    pub fn field(name: impl Into<String>) -> Self {
        Self::new("field", vec![Scalar::Text(name.into())])
    }

    /// A parameterless function part such as `avg`
    pub fn function(kind: impl Into<String>) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Parameters as stored, empty when the key is absent
    pub fn params(&self) -> &[Scalar] {
        self.params.as_deref().unwrap_or_default()
    }

    /// First parameter rendered as text
    pub fn first_param(&self) -> Option<String> {
        self.params().first().map(|p| p.to_string())
    }
}

/// One filter predicate in the WHERE clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagItem {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Boolean connective to the previous predicate (`AND`/`OR`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub value: String,
}

impl TagItem {
    /// Create a predicate with an inferred operator
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: None,
            condition: None,
            value: value.into(),
        }
    }

    /// Set an explicit operator
    pub fn operator(mut self, op: impl Into<String>) -> Self {
        self.operator = Some(op.into());
        self
    }

    /// Set the connective to the previous predicate
    pub fn condition(mut self, cond: impl Into<String>) -> Self {
        self.condition = Some(cond.into());
        self
    }
}

/// Sort direction on the time column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderByTime {
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl fmt::Display for OrderByTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

/// The persisted query target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hide: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<Vec<SelectItem>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<SelectItem>>,
    /// Mirror of the `time` group-by parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    /// Mirror of the `fill` group-by parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by_time: Option<OrderByTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub raw_query: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Query {
    /// Create an empty query over a table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Default::default()
        }
    }

    /// Create a raw query that renders `text` verbatim
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            raw_query: true,
            query_text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Decode a persisted query from JSON
    pub fn from_json(json: &str) -> crate::query::QueryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add a filter predicate
    pub fn with_tag(mut self, tag: TagItem) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag);
        self
    }

    /// Set the row limit
    pub fn with_limit(mut self, limit: impl Into<Scalar>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Set the select lists
    pub fn with_select(mut self, select: Vec<Vec<SelectItem>>) -> Self {
        self.select = Some(select);
        self
    }

    /// Set the group-by parts
    pub fn with_group_by(mut self, group_by: Vec<SelectItem>) -> Self {
        self.group_by = Some(group_by);
        self
    }

    /// Set the sort direction
    pub fn order_by(mut self, order: OrderByTime) -> Self {
        self.order_by_time = Some(order);
        self
    }
}
