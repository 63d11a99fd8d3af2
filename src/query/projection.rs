//! Projection
//!
//! Derives the editable view of a persisted query: every select list and
//! group-by item resolved to a [`QueryPart`]. Projecting also yields a
//! [`ProjectionPatch`] describing the denormalized fields the persisted query
//! must mirror:
//!
//! ```text
//! groupBy: [time($__interval), fill(null)]
//!     -> interval = "$__interval", fill = "null"
//!     -> groupBy[0] rewritten to time(time), the column alias DATE_BIN produces
//! ```
//!
//! The patch is returned rather than applied so callers decide when the
//! stored query changes.

use crate::query::error::QueryResult;
use crate::query::part::QueryPart;
use crate::query::registry::{PartKind, PartRegistry};
use crate::query::types::{Query, Scalar, SelectItem};

/// Column alias of the bucketed time expression
pub const TIME_COLUMN: &str = "time";

/// Resolved, editable view of a query
#[derive(Debug, Clone, Default)]
pub struct Projection<'r> {
    pub select_models: Vec<Vec<QueryPart<'r>>>,
    pub group_by_parts: Vec<QueryPart<'r>>,
}

/// Changes the persisted query needs so it agrees with its projection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionPatch {
    /// New value for `Query::interval`
    pub interval: Option<String>,
    /// New value for `Query::fill`
    pub fill: Option<String>,
    /// Position of a `time` group-by item whose parameter becomes the column alias
    pub time_column: Option<usize>,
}

impl ProjectionPatch {
    pub fn is_empty(&self) -> bool {
        self.interval.is_none() && self.fill.is_none() && self.time_column.is_none()
    }

    /// Write the patch into the stored query
    pub fn apply(&self, query: &mut Query) {
        if let Some(interval) = &self.interval {
            query.interval = Some(interval.clone());
        }
        if let Some(fill) = &self.fill {
            query.fill = Some(fill.clone());
        }
        if let Some(index) = self.time_column {
            if let Some(item) = query.group_by.as_mut().and_then(|g| g.get_mut(index)) {
                set_first_param(item, TIME_COLUMN);
            }
        }
    }
}

/// Resolve every part of `query` without touching it
pub fn project<'r>(
    query: &Query,
    registry: &'r PartRegistry,
) -> QueryResult<(Projection<'r>, ProjectionPatch)> {
    let mut patch = ProjectionPatch::default();

    let select_models = query
        .select
        .iter()
        .flatten()
        .map(|parts| {
            parts
                .iter()
                .map(|item| registry.create(item))
                .collect::<QueryResult<Vec<_>>>()
        })
        .collect::<QueryResult<Vec<_>>>()?;

    let mut group_by_parts = Vec::new();
    for (index, item) in query.group_by.iter().flatten().enumerate() {
        let kind: PartKind = item.kind.parse()?;
        let part = match kind {
            PartKind::Time => {
                let mut item = item.clone();
                let param = item.first_param();
                // Already rewritten items keep the interval recorded earlier
                if param.as_deref() != Some(TIME_COLUMN) {
                    patch.interval = param;
                    patch.time_column = Some(index);
                    set_first_param(&mut item, TIME_COLUMN);
                }
                registry.create(&item)?
            }
            PartKind::Fill => {
                patch.fill = item.first_param();
                registry.create(item)?
            }
            _ => registry.create(item)?,
        };
        group_by_parts.push(part);
    }

    Ok((
        Projection {
            select_models,
            group_by_parts,
        },
        patch,
    ))
}

fn set_first_param(item: &mut SelectItem, value: &str) {
    let params = item.params.get_or_insert_with(Vec::new);
    match params.first_mut() {
        Some(param) => *param = Scalar::from(value),
        None => params.push(Scalar::from(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::error::QueryError;

    fn sample_query() -> Query {
        Query::new("cpu")
            .with_select(vec![vec![SelectItem::field("value"), SelectItem::function("avg")]])
            .with_group_by(vec![
                SelectItem::new("time", vec![Scalar::from("10 minutes")]),
                SelectItem::new("tag", vec![Scalar::from("host")]),
                SelectItem::new("fill", vec![Scalar::from("previous")]),
            ])
    }

    #[test]
    fn test_project_leaves_query_untouched() {
        let registry = PartRegistry::standard();
        let query = sample_query();
        let before = query.clone();

        let (projection, patch) = project(&query, &registry).unwrap();

        assert_eq!(query, before);
        assert_eq!(projection.select_models.len(), 1);
        assert_eq!(projection.select_models[0].len(), 2);
        assert_eq!(projection.group_by_parts.len(), 3);
        assert_eq!(projection.group_by_parts[0].params, vec![Scalar::from("time")]);
        assert_eq!(patch.interval.as_deref(), Some("10 minutes"));
        assert_eq!(patch.fill.as_deref(), Some("previous"));
        assert_eq!(patch.time_column, Some(0));
    }

    #[test]
    fn test_apply_patch() {
        let registry = PartRegistry::standard();
        let mut query = sample_query();

        let (_, patch) = project(&query, &registry).unwrap();
        patch.apply(&mut query);

        assert_eq!(query.interval.as_deref(), Some("10 minutes"));
        assert_eq!(query.fill.as_deref(), Some("previous"));
        let group_by = query.group_by.as_ref().unwrap();
        assert_eq!(group_by[0].first_param().as_deref(), Some("time"));
    }

    #[test]
    fn test_reprojection_keeps_interval() {
        let registry = PartRegistry::standard();
        let mut query = sample_query();

        let (_, patch) = project(&query, &registry).unwrap();
        patch.apply(&mut query);
        let (_, second) = project(&query, &registry).unwrap();
        second.apply(&mut query);

        assert!(second.interval.is_none());
        assert_eq!(second.time_column, None);
        assert_eq!(query.interval.as_deref(), Some("10 minutes"));
    }

    #[test]
    fn test_project_unknown_part() {
        let registry = PartRegistry::standard();
        let query = Query::new("cpu").with_select(vec![vec![
            SelectItem::field("value"),
            SelectItem::function("median"),
        ]]);

        let result = project(&query, &registry);
        assert!(matches!(result, Err(QueryError::UnknownPart(_))));
    }

    #[test]
    fn test_empty_patch() {
        let registry = PartRegistry::standard();
        let query = Query::new("cpu");
        let (projection, patch) = project(&query, &registry).unwrap();
        assert!(patch.is_empty());
        assert!(projection.select_models.is_empty());
    }
}
