//! Metadata lookup
//!
//! Part parameters such as field references and tag keys offer choices that
//! come from the database schema. This module defines the lookup capability
//! and resolves part-list choices through it:
//! - [`MetadataSource`]: async schema lookups supplied by the host
//! - [`MetaQuery`]: the statements a SQL-backed source sends
//! - [`StaticMetadata`]: an in-memory schema loaded from JSON

mod static_source;

pub use static_source::{StaticMetadata, TableSchema};

use crate::query::{
    render_conditions, DynamicLookup, ParamOptions, PartListEntry, QueryError, TagItem,
};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde::Serialize;

/// Schema lookups used to fill dynamic parameter choices
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Tables, optionally narrowed by a name filter
    async fn table_names(&self, filter: Option<&str>) -> MetadataResult<Vec<String>>;

    /// Field columns of a table
    async fn field_names(&self, table: &str) -> MetadataResult<Vec<String>>;

    /// Tag columns of a table
    async fn tag_keys(&self, table: &str, known_tags: &[TagItem]) -> MetadataResult<Vec<String>>;

    /// Values of one tag column
    async fn tag_values(
        &self,
        table: &str,
        key: &str,
        known_tags: &[TagItem],
    ) -> MetadataResult<Vec<String>>;
}

/// Errors that can occur during metadata lookups
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown tag key: {0}")]
    UnknownTagKey(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),
}

/// Result type for metadata lookups
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Metadata statement sent to a SQL-backed source
#[derive(Debug, Clone, PartialEq)]
pub enum MetaQuery<'a> {
    Tables,
    TagKeys { table: &'a str },
    FieldNames { table: &'a str },
    TagValues {
        table: &'a str,
        key: &'a str,
        tags: &'a [TagItem],
    },
}

impl MetaQuery<'_> {
    /// Statement text. Column-listing statements carry a leading comment the
    /// server uses to pick tag or field columns.
    pub fn to_sql(&self) -> String {
        match self {
            Self::Tables => "SHOW TABLES".to_string(),
            Self::TagKeys { table } => format!("-- tag;\nDESCRIBE TABLE {}", table),
            Self::FieldNames { table } => format!("-- field;\nDESCRIBE TABLE {}", table),
            Self::TagValues { table, key, tags } => {
                let mut sql = format!("SHOW TAG VALUES FROM \"{}\" WITH KEY = \"{}\"", table, key);
                if !tags.is_empty() {
                    sql.push_str(" WHERE ");
                    sql.push_str(&render_conditions(tags, None));
                }
                sql
            }
        }
    }
}

/// A part-list parameter with its choices resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedParam {
    pub value: String,
    pub choices: Vec<String>,
}

/// A part-list entry with every parameter's choices resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEntry {
    pub name: String,
    pub params: Vec<ResolvedParam>,
}

/// Choices for one parameter slot of a part.
///
/// `table` is the table the query reads, as resolved by
/// [`QueryModel::table_name`](crate::query::QueryModel::table_name), and
/// `tags` its filter predicates.
pub async fn resolve_options(
    options: &ParamOptions,
    source: &dyn MetadataSource,
    table: &str,
    tags: &[TagItem],
) -> MetadataResult<Vec<String>> {
    match options {
        ParamOptions::None => Ok(Vec::new()),
        ParamOptions::Static(values) => Ok(values.clone()),
        ParamOptions::Dynamic(DynamicLookup::FieldNames) => source.field_names(table).await,
        ParamOptions::Dynamic(DynamicLookup::TagKeys) => source.tag_keys(table, tags).await,
    }
}

/// Resolve the choices of every parameter of `entries` concurrently
pub async fn resolve_part_list(
    entries: &[PartListEntry],
    source: &dyn MetadataSource,
    table: &str,
    tags: &[TagItem],
) -> MetadataResult<Vec<ResolvedEntry>> {
    try_join_all(entries.iter().map(|entry| async move {
        let params = try_join_all(entry.params.iter().map(|param| async move {
            let choices = resolve_options(&param.options, source, table, tags).await?;
            Ok::<_, MetadataError>(ResolvedParam {
                value: param.value.clone(),
                choices,
            })
        }))
        .await?;

        Ok::<_, MetadataError>(ResolvedEntry {
            name: entry.name.clone(),
            params,
        })
    }))
    .await
}
