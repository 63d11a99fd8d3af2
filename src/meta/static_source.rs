//! In-memory schema
//!
//! A [`MetadataSource`] over a fixed schema, loaded from JSON:
//!
//! ```json
//! {"tables": {"cpu": {"fields": ["usage"], "tags": {"host": ["a", "b"]}}}}
//! ```

use super::{MetadataError, MetadataResult, MetadataSource};
use crate::query::TagItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Columns of one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<String>,
    /// Tag key to known values
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
}

/// Fixed schema answering metadata lookups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMetadata {
    #[serde(default)]
    pub tables: BTreeMap<String, TableSchema>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schema document
    pub fn from_json(json: &str) -> MetadataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a schema document from disk
    pub async fn load<P: AsRef<Path>>(path: P) -> MetadataResult<Self> {
        let path = path.as_ref();
        debug!("Loading schema from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Add or replace a table
    pub fn with_table(mut self, name: impl Into<String>, schema: TableSchema) -> Self {
        self.tables.insert(name.into(), schema);
        self
    }

    fn table(&self, name: &str) -> MetadataResult<&TableSchema> {
        self.tables
            .get(name)
            .ok_or_else(|| MetadataError::UnknownTable(name.to_string()))
    }
}

#[async_trait]
impl MetadataSource for StaticMetadata {
    async fn table_names(&self, filter: Option<&str>) -> MetadataResult<Vec<String>> {
        Ok(self
            .tables
            .keys()
            .filter(|name| filter.map_or(true, |f| name.contains(f)))
            .cloned()
            .collect())
    }

    async fn field_names(&self, table: &str) -> MetadataResult<Vec<String>> {
        Ok(self.table(table)?.fields.clone())
    }

    async fn tag_keys(&self, table: &str, _known_tags: &[TagItem]) -> MetadataResult<Vec<String>> {
        Ok(self.table(table)?.tags.keys().cloned().collect())
    }

    async fn tag_values(
        &self,
        table: &str,
        key: &str,
        _known_tags: &[TagItem],
    ) -> MetadataResult<Vec<String>> {
        self.table(table)?
            .tags
            .get(key)
            .cloned()
            .ok_or_else(|| MetadataError::UnknownTagKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample() -> StaticMetadata {
        StaticMetadata::new()
            .with_table(
                "cpu",
                TableSchema {
                    fields: vec!["usage".into()],
                    tags: BTreeMap::from([("host".to_string(), vec!["a".to_string()])]),
                },
            )
            .with_table("mem", TableSchema::default())
    }

    #[tokio::test]
    async fn test_table_names() {
        let source = sample();
        assert_eq!(source.table_names(None).await.unwrap(), vec!["cpu", "mem"]);
        assert_eq!(source.table_names(Some("me")).await.unwrap(), vec!["mem"]);
    }

    #[tokio::test]
    async fn test_tag_values() {
        let source = sample();
        assert_eq!(source.tag_values("cpu", "host", &[]).await.unwrap(), vec!["a"]);
        assert!(matches!(
            source.tag_values("cpu", "dc", &[]).await,
            Err(MetadataError::UnknownTagKey(_))
        ));
        assert!(matches!(
            source.field_names("disk").await,
            Err(MetadataError::UnknownTable(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"tables": {{"cpu": {{"fields": ["usage"]}}}}}}"#).unwrap();

        let source = StaticMetadata::load(file.path()).await.unwrap();

        assert_eq!(source.field_names("cpu").await.unwrap(), vec!["usage"]);
        assert!(source.tag_keys("cpu", &[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            StaticMetadata::from_json("{"),
            Err(MetadataError::Parse(_))
        ));
    }
}
