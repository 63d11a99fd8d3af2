//! Query Model
//!
//! Owns one persisted query for the length of an edit session, keeps its
//! projection (resolved select lists and group-by parts) in sync with it and
//! renders it to SQL.
//!
//! # Edit cycle
//!
//! ```text
//! Query ──new()──▶ QueryModel ──add_/remove_*()──▶ QueryModel ──into_query()──▶ Query
//!                      │
//!                      └──render()──▶ SELECT ... FROM ... WHERE ... AND $timeFilter ...
//! ```
//!
//! Select-list edits change the projection and are flattened back into
//! `Query::select`; group-by edits change `Query::group_by` and re-project.

use crate::query::error::{QueryError, QueryResult};
use crate::query::part::{render_select_list, QueryPart};
use crate::query::projection::project;
use crate::query::registry::{PartKind, PartRegistry};
use crate::query::render::{
    render_conditions, render_table, render_tag_condition, time_bucket, DEFAULT_TABLE,
    TIME_FILTER,
};
use crate::query::strategy;
use crate::query::types::{OrderByTime, Query, Scalar, SelectItem, TagItem};
use crate::templating::{Interpolator, VariableFormat};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Values filled into a query that lacks them
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDefaults {
    pub table: String,
    pub order_by_time: OrderByTime,
    pub group_by: Vec<SelectItem>,
    pub select: Vec<Vec<SelectItem>>,
}

impl QueryDefaults {
    /// Defaults built from individual settings
    pub fn new(table: &str, field: &str, aggregation: &str, interval: &str, fill: &str) -> Self {
        Self {
            table: table.to_string(),
            order_by_time: OrderByTime::Asc,
            group_by: vec![
                SelectItem::new("time", vec![Scalar::from(interval)]),
                SelectItem::new("fill", vec![Scalar::from(fill)]),
            ],
            select: vec![vec![SelectItem::field(field), SelectItem::function(aggregation)]],
        }
    }
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE, "value", "avg", "$__interval", "null")
    }
}

fn group_by_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+)\((.*)\)$").expect("group by pattern is valid"))
}

/// Editable model over one persisted query
#[derive(Clone)]
pub struct QueryModel<'r> {
    target: Query,
    registry: &'r PartRegistry,
    interpolator: Option<&'r dyn Interpolator>,
    default_table: String,
    select_models: Vec<Vec<QueryPart<'r>>>,
    group_by_parts: Vec<QueryPart<'r>>,
}

impl std::fmt::Debug for QueryModel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryModel")
            .field("target", &self.target)
            .field("interpolator", &self.interpolator.is_some())
            .field("select_models", &self.select_models)
            .field("group_by_parts", &self.group_by_parts)
            .finish()
    }
}

impl<'r> QueryModel<'r> {
    /// Wrap `target`, filling missing fields with the standard defaults
    pub fn new(target: Query, registry: &'r PartRegistry) -> QueryResult<Self> {
        Self::with_defaults(target, registry, &QueryDefaults::default())
    }

    /// Wrap `target`, filling missing fields from `defaults`
    pub fn with_defaults(
        mut target: Query,
        registry: &'r PartRegistry,
        defaults: &QueryDefaults,
    ) -> QueryResult<Self> {
        target.order_by_time.get_or_insert(defaults.order_by_time);
        target.tags.get_or_insert_with(Vec::new);
        target
            .group_by
            .get_or_insert_with(|| defaults.group_by.clone());
        target.select.get_or_insert_with(|| defaults.select.clone());

        let mut model = Self {
            target,
            registry,
            interpolator: None,
            default_table: defaults.table.clone(),
            select_models: Vec::new(),
            group_by_parts: Vec::new(),
        };
        model.update_projection()?;
        Ok(model)
    }

    /// Use `interpolator` when rendering with interpolation
    pub fn with_interpolator(mut self, interpolator: &'r dyn Interpolator) -> Self {
        self.interpolator = Some(interpolator);
        self
    }

    /// The persisted query as currently edited
    pub fn target(&self) -> &Query {
        &self.target
    }

    /// Hand the edited query back
    pub fn into_query(self) -> Query {
        self.target
    }

    pub fn select_models(&self) -> &[Vec<QueryPart<'r>>] {
        &self.select_models
    }

    pub fn group_by_parts(&self) -> &[QueryPart<'r>] {
        &self.group_by_parts
    }

    /// Re-derive the projection from the persisted query and apply the
    /// resulting patch to it
    pub fn update_projection(&mut self) -> QueryResult<()> {
        let (projection, patch) = project(&self.target, self.registry)?;
        patch.apply(&mut self.target);
        self.select_models = projection.select_models;
        self.group_by_parts = projection.group_by_parts;
        Ok(())
    }

    /// Flatten the select projection back into `Query::select`
    pub fn update_persisted_parts(&mut self) {
        self.target.select = Some(
            self.select_models
                .iter()
                .map(|parts| parts.iter().map(QueryPart::to_item).collect())
                .collect(),
        );
    }

    pub fn has_group_by_time(&self) -> bool {
        self.has_group_by(PartKind::Time)
    }

    pub fn has_fill(&self) -> bool {
        self.has_group_by(PartKind::Fill)
    }

    fn has_group_by(&self, kind: PartKind) -> bool {
        self.target
            .group_by
            .iter()
            .flatten()
            .any(|g| g.kind == kind.as_str())
    }

    /// Add a group-by part from a `name(args)` string such as `tag(host)`.
    ///
    /// Strings of another shape are ignored. `time` always goes first and
    /// `tag` goes before a trailing `fill`. A `time` or `fill` part replaces
    /// the one already present.
    pub fn add_group_by(&mut self, value: &str) -> QueryResult<()> {
        let Some(caps) = group_by_pattern().captures(value) else {
            debug!("Ignoring malformed group by: {}", value);
            return Ok(());
        };
        let item = SelectItem::new(&caps[1], vec![Scalar::from(&caps[2])]);
        let kind = self.registry.create(&item)?.kind();

        let group_by = self.target.group_by.get_or_insert_with(Vec::new);
        let existing = match kind {
            PartKind::Time | PartKind::Fill => {
                group_by.iter().position(|g| g.kind == kind.as_str())
            }
            _ => None,
        };
        if let Some(index) = existing {
            debug!("Replacing group by {} at {}", kind.as_str(), index);
            group_by[index] = item;
            return self.update_projection();
        }

        let ends_with_fill = group_by
            .last()
            .is_some_and(|last| last.kind == PartKind::Fill.as_str());
        let at = match kind {
            PartKind::Time => 0,
            PartKind::Tag if ends_with_fill => group_by.len() - 1,
            _ => group_by.len(),
        };
        group_by.insert(at, item);

        self.update_projection()
    }

    /// Remove the group-by part at `index`.
    ///
    /// Removing `time` also removes `fill` and every aggregation or selector,
    /// since those only make sense over time buckets.
    pub fn remove_group_by_part(&mut self, index: usize) -> QueryResult<()> {
        let group_by = self.target.group_by.get_or_insert_with(Vec::new);
        if index >= group_by.len() {
            return Err(QueryError::IndexOutOfRange {
                what: "group by part",
                index,
                len: group_by.len(),
            });
        }

        let removed = group_by.remove(index);
        if removed.kind == PartKind::Time.as_str() {
            group_by.retain(|g| g.kind != PartKind::Fill.as_str());
            self.target.interval = None;
            self.target.fill = None;

            let registry = self.registry;
            for parts in self.target.select.iter_mut().flatten() {
                parts.retain(|item| {
                    registry
                        .definition(&item.kind)
                        .map(|def| !def.category.is_primary())
                        .unwrap_or(true)
                });
            }
        } else if removed.kind == PartKind::Fill.as_str() {
            self.target.fill = None;
        }

        self.update_projection()
    }

    /// Remove the whole select list at `index`
    pub fn remove_select(&mut self, index: usize) -> QueryResult<()> {
        let select = self.target.select.get_or_insert_with(Vec::new);
        if index >= select.len() {
            return Err(QueryError::IndexOutOfRange {
                what: "select list",
                index,
                len: select.len(),
            });
        }
        select.remove(index);
        self.update_projection()
    }

    /// Remove one part of a select list. Removing the field removes the whole
    /// list, unless it is the only one.
    pub fn remove_select_part(&mut self, list: usize, part: usize) -> QueryResult<()> {
        self.check_list(list)?;
        let parts = &self.select_models[list];
        if part >= parts.len() {
            return Err(QueryError::IndexOutOfRange {
                what: "select part",
                index: part,
                len: parts.len(),
            });
        }

        if parts[part].kind() == PartKind::Field {
            if self.select_models.len() > 1 {
                self.select_models.remove(list);
            } else {
                warn!("Ignoring removal of the only select field");
            }
        } else {
            self.select_models[list].remove(part);
        }

        self.update_persisted_parts();
        Ok(())
    }

    /// Add a part of type `kind` to the select list at `list`, merged by the
    /// part's add strategy
    pub fn add_select_part(&mut self, list: usize, kind: &str) -> QueryResult<()> {
        self.check_list(list)?;
        let part = self.registry.create(&SelectItem::bare(kind))?;
        let strategy = part
            .def()
            .add_strategy
            .ok_or_else(|| QueryError::NotSelectable(kind.to_string()))?;

        strategy::apply(strategy, &mut self.select_models, list, part);
        self.update_persisted_parts();
        Ok(())
    }

    fn check_list(&self, list: usize) -> QueryResult<()> {
        if list >= self.select_models.len() {
            return Err(QueryError::IndexOutOfRange {
                what: "select list",
                index: list,
                len: self.select_models.len(),
            });
        }
        Ok(())
    }

    fn active_interpolator(&self, interpolate: bool) -> Option<&'r dyn Interpolator> {
        if interpolate {
            self.interpolator
        } else {
            None
        }
    }

    /// One WHERE-clause predicate
    pub fn render_tag_condition(&self, tag: &TagItem, index: usize, interpolate: bool) -> String {
        render_tag_condition(tag, index, self.active_interpolator(interpolate))
    }

    /// Name of the table the query reads, before quoting or interpolation
    pub fn table_name(&self) -> &str {
        self.target
            .table
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.default_table)
    }

    /// The FROM target
    pub fn table(&self, interpolate: bool) -> String {
        render_table(self.table_name(), self.active_interpolator(interpolate))
    }

    /// Serialize the query to one SQL statement.
    ///
    /// Raw queries return their text. Structured queries render as
    /// `SELECT <time>, <columns> FROM <table> WHERE (<tags>) AND $timeFilter
    /// [GROUP BY ...] ORDER BY time <dir> [LIMIT n]`; `fill` parts never reach
    /// the GROUP BY clause.
    pub fn render(&self, interpolate: bool) -> String {
        let target = &self.target;
        let interpolator = self.active_interpolator(interpolate);

        if target.raw_query {
            let text = target.query_text.as_deref().unwrap_or_default();
            return match interpolator {
                Some(i) => {
                    debug!("Rendering raw query with interpolation");
                    i.replace(text, VariableFormat::MultiRegex)
                }
                None => {
                    debug!("Rendering raw query");
                    text.to_string()
                }
            };
        }

        let mut columns = vec![match target.interval.as_deref() {
            Some(interval) if !interval.is_empty() => time_bucket(interval),
            _ => "time".to_string(),
        }];
        columns.extend(self.select_models.iter().map(|parts| render_select_list(parts)));

        let mut sql = format!(
            "SELECT {} FROM {} WHERE ",
            columns.join(", "),
            self.table(interpolate)
        );

        let tags = target.tags.as_deref().unwrap_or_default();
        if !tags.is_empty() {
            sql.push_str(&format!("({}) AND ", render_conditions(tags, interpolator)));
        }
        sql.push_str(TIME_FILTER);

        let group_by: Vec<String> = self
            .group_by_parts
            .iter()
            .filter(|part| part.kind() != PartKind::Fill)
            .map(|part| part.render(""))
            .collect();
        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
        }

        sql.push_str(&format!(
            " ORDER BY time {}",
            target.order_by_time.unwrap_or_default()
        ));

        if let Some(limit) = target.limit.as_ref().filter(|l| l.is_set()) {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        debug!(query = %sql, "Rendered query");
        sql
    }

    /// Ad-hoc filters to append to an existing WHERE clause; variables are
    /// always substituted
    pub fn render_adhoc_filters(&self, filters: &[TagItem]) -> String {
        render_conditions(filters, self.interpolator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::registry::Category;
    use crate::templating::TemplateVariables;

    fn cpu_query() -> Query {
        Query::new("cpu")
            .with_select(vec![vec![SelectItem::field("value"), SelectItem::function("avg")]])
            .with_group_by(vec![
                SelectItem::new("time", vec![Scalar::from("$__interval")]),
                SelectItem::new("fill", vec![Scalar::from("null")]),
            ])
            .with_tag(TagItem::new("host", "server1"))
            .order_by(OrderByTime::Asc)
    }

    fn kinds(model: &QueryModel<'_>, list: usize) -> Vec<&'static str> {
        model.select_models()[list]
            .iter()
            .map(|p| p.kind().as_str())
            .collect()
    }

    #[test]
    fn test_defaults_filled() {
        let registry = PartRegistry::standard();
        let model = QueryModel::new(Query::default(), &registry).unwrap();
        let target = model.target();

        assert_eq!(target.order_by_time, Some(OrderByTime::Asc));
        assert_eq!(target.tags, Some(vec![]));
        assert_eq!(target.interval.as_deref(), Some("$__interval"));
        assert_eq!(target.fill.as_deref(), Some("null"));
        assert_eq!(
            target.select,
            Some(vec![vec![SelectItem::field("value"), SelectItem::function("avg")]])
        );
        assert_eq!(target.group_by.as_ref().unwrap()[0].first_param().as_deref(), Some("time"));
        assert_eq!(
            model.render(false),
            "SELECT DATE_BIN(INTERVAL '$__interval', time, TIMESTAMP '1970-01-01T00:00:00Z') AS time, avg(\"value\") \
             FROM \"default_table\" WHERE $timeFilter GROUP BY time ORDER BY time ASC"
        );
    }

    #[test]
    fn test_render_end_to_end() {
        let registry = PartRegistry::standard();
        let model = QueryModel::new(cpu_query(), &registry).unwrap();

        assert_eq!(
            model.render(false),
            "SELECT DATE_BIN(INTERVAL '$__interval', time, TIMESTAMP '1970-01-01T00:00:00Z') AS time, avg(\"value\") \
             FROM \"cpu\" WHERE (\"host\" = 'server1') AND $timeFilter GROUP BY time ORDER BY time ASC"
        );
    }

    #[test]
    fn test_render_without_interval_limit_and_order() {
        let registry = PartRegistry::standard();
        let query = Query::new("cpu")
            .with_select(vec![
                vec![SelectItem::field("usage")],
                vec![SelectItem::field("*")],
            ])
            .with_group_by(vec![SelectItem::new("tag", vec![Scalar::from("host")])])
            .order_by(OrderByTime::Desc)
            .with_limit(100u64);
        let model = QueryModel::new(query, &registry).unwrap();

        assert_eq!(
            model.render(false),
            "SELECT time, \"usage\", * FROM \"cpu\" WHERE $timeFilter GROUP BY \"host\" ORDER BY time DESC LIMIT 100"
        );
    }

    #[test]
    fn test_render_skips_unset_limit_and_leading_fill() {
        let registry = PartRegistry::standard();
        let query = Query::new("cpu")
            .with_group_by(vec![
                SelectItem::new("fill", vec![Scalar::from("0")]),
                SelectItem::new("tag", vec![Scalar::from("host")]),
            ])
            .with_limit("");
        let model = QueryModel::new(query, &registry).unwrap();
        let sql = model.render(false);

        assert!(sql.ends_with("GROUP BY \"host\" ORDER BY time ASC"), "{}", sql);
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn test_render_raw_query() {
        let registry = PartRegistry::standard();
        let mut vars = TemplateVariables::new();
        vars.set("t", "cpu");

        let model = QueryModel::new(Query::raw("SELECT * FROM $t"), &registry)
            .unwrap()
            .with_interpolator(&vars);
        assert_eq!(model.render(false), "SELECT * FROM $t");
        assert_eq!(model.render(true), "SELECT * FROM cpu");
    }

    #[test]
    fn test_render_interpolates_tags_and_table() {
        let registry = PartRegistry::standard();
        let mut vars = TemplateVariables::new();
        vars.set("host", "web-1").set("m", "cpu");

        let query = Query::new("/^$m$/")
            .with_tag(TagItem::new("host", "$host"))
            .with_group_by(vec![]);
        let model = QueryModel::new(query, &registry)
            .unwrap()
            .with_interpolator(&vars);

        assert_eq!(
            model.render(true),
            "SELECT time, avg(\"value\") FROM /^cpu$/ WHERE (\"host\" = 'web-1') AND $timeFilter ORDER BY time ASC"
        );
        assert_eq!(model.table(false), "/^$m$/");
    }

    #[test]
    fn test_render_adhoc_filters() {
        let registry = PartRegistry::standard();
        let mut vars = TemplateVariables::new();
        vars.set("dc", "eu");
        let model = QueryModel::new(Query::new("cpu"), &registry)
            .unwrap()
            .with_interpolator(&vars);

        let filters = vec![
            TagItem::new("dc", "$dc"),
            TagItem::new("rack", "/r[0-9]/").condition("OR"),
        ];
        assert_eq!(
            model.render_adhoc_filters(&filters),
            "\"dc\" = 'eu' OR \"rack\" =~ /r[0-9]/"
        );
    }

    #[test]
    fn test_persisted_parts_round_trip() {
        let registry = PartRegistry::standard();
        let query = cpu_query().with_select(vec![
            vec![
                SelectItem::field("value"),
                SelectItem::function("avg"),
                SelectItem::new("alias", vec![Scalar::from("mean")]),
            ],
            vec![SelectItem::field("idle"), SelectItem::function("max")],
        ]);
        let original = query.select.clone();

        let mut model = QueryModel::new(query, &registry).unwrap();
        model.update_persisted_parts();

        assert_eq!(model.target().select, original);
    }

    #[test]
    fn test_unknown_part_rejected() {
        let registry = PartRegistry::standard();
        let query = Query::new("cpu")
            .with_select(vec![vec![SelectItem::field("value"), SelectItem::function("median")]]);
        let result = QueryModel::new(query, &registry);
        assert!(matches!(result, Err(QueryError::UnknownPart(_))));
    }

    #[test]
    fn test_add_same_aggregation_is_idempotent() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();
        let before = model.target().select.clone();

        model.add_select_part(0, "avg").unwrap();

        assert_eq!(model.target().select, before);
    }

    #[test]
    fn test_add_distinct_then_count() {
        let registry = PartRegistry::standard();
        let query = cpu_query()
            .with_select(vec![vec![SelectItem::field("value"), SelectItem::function("count")]]);
        let mut model = QueryModel::new(query, &registry).unwrap();

        model.add_select_part(0, "distinct").unwrap();
        model.add_select_part(0, "count").unwrap();

        assert_eq!(kinds(&model, 0), vec!["field", "distinct", "count"]);
        assert!(model.render(false).contains("count(distinct(\"value\"))"));
    }

    #[test]
    fn test_add_field_duplicates_column() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();

        model.add_select_part(0, "field").unwrap();

        let select = model.target().select.as_ref().unwrap();
        assert_eq!(select.len(), 2);
        assert_eq!(select[0], select[1]);
    }

    #[test]
    fn test_add_alias() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();

        model.add_select_part(0, "alias").unwrap();
        model.add_select_part(0, "alias").unwrap();

        assert_eq!(kinds(&model, 0), vec!["field", "avg", "alias"]);
        assert!(model.render(false).contains("avg(\"value\") AS \"alias\""));
    }

    #[test]
    fn test_add_group_by_only_part_not_selectable() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();

        let result = model.add_select_part(0, "fill");
        assert_eq!(result, Err(QueryError::NotSelectable("fill".to_string())));

        let result = model.add_select_part(3, "avg");
        assert!(matches!(result, Err(QueryError::IndexOutOfRange { index: 3, .. })));
    }

    #[test]
    fn test_remove_only_field_is_ignored() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();
        let before = model.target().select.clone();

        model.remove_select_part(0, 0).unwrap();

        assert_eq!(model.target().select, before);
    }

    #[test]
    fn test_remove_field_removes_list() {
        let registry = PartRegistry::standard();
        let query = cpu_query().with_select(vec![
            vec![SelectItem::field("value"), SelectItem::function("avg")],
            vec![SelectItem::field("idle"), SelectItem::function("max")],
        ]);
        let mut model = QueryModel::new(query, &registry).unwrap();

        model.remove_select_part(0, 0).unwrap();

        let select = model.target().select.as_ref().unwrap();
        assert_eq!(select.len(), 1);
        assert_eq!(select[0][0], SelectItem::field("idle"));
    }

    #[test]
    fn test_remove_non_field_part() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();

        model.remove_select_part(0, 1).unwrap();
        assert_eq!(kinds(&model, 0), vec!["field"]);

        let result = model.remove_select_part(0, 5);
        assert!(matches!(result, Err(QueryError::IndexOutOfRange { what: "select part", .. })));
    }

    #[test]
    fn test_remove_select() {
        let registry = PartRegistry::standard();
        let query = cpu_query().with_select(vec![
            vec![SelectItem::field("a")],
            vec![SelectItem::field("b")],
        ]);
        let mut model = QueryModel::new(query, &registry).unwrap();

        model.remove_select(0).unwrap();
        assert_eq!(model.select_models().len(), 1);
        assert!(model.remove_select(4).is_err());
    }

    #[test]
    fn test_remove_time_cascades() {
        let registry = PartRegistry::standard();
        let query = cpu_query().with_select(vec![
            vec![
                SelectItem::field("value"),
                SelectItem::function("avg"),
                SelectItem::new("alias", vec![Scalar::from("mean")]),
            ],
            vec![SelectItem::field("idle"), SelectItem::function("max")],
        ]);
        let mut model = QueryModel::new(query, &registry).unwrap();

        model.remove_group_by_part(0).unwrap();

        assert!(!model.has_group_by_time());
        assert!(!model.has_fill());
        assert!(model.target().interval.is_none());
        for parts in model.select_models() {
            assert!(parts.iter().all(|p| !p.category().is_primary()));
        }
        assert_eq!(kinds(&model, 0), vec!["field", "alias"]);
        assert_eq!(
            model.render(false),
            "SELECT time, \"value\" AS \"mean\", \"idle\" FROM \"cpu\" WHERE (\"host\" = 'server1') AND $timeFilter ORDER BY time ASC"
        );
    }

    #[test]
    fn test_remove_fill_keeps_time() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();

        model.remove_group_by_part(1).unwrap();

        assert!(model.has_group_by_time());
        assert!(!model.has_fill());
        assert!(model.target().fill.is_none());
        assert_eq!(model.target().interval.as_deref(), Some("$__interval"));
        assert!(model.remove_group_by_part(7).is_err());
    }

    #[test]
    fn test_add_group_by_positions() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();

        model.add_group_by("tag(host)").unwrap();
        let names: Vec<_> = model.group_by_parts().iter().map(|p| p.kind()).collect();
        assert_eq!(names, vec![PartKind::Time, PartKind::Tag, PartKind::Fill]);

        model.remove_group_by_part(0).unwrap();
        model.add_group_by("time(5 minutes)").unwrap();
        model.add_group_by("tag(dc)").unwrap();
        model.add_group_by("fill(previous)").unwrap();

        let names: Vec<_> = model.group_by_parts().iter().map(|p| p.kind()).collect();
        assert_eq!(
            names,
            vec![PartKind::Time, PartKind::Tag, PartKind::Tag, PartKind::Fill]
        );
        assert_eq!(model.target().interval.as_deref(), Some("5 minutes"));
        assert_eq!(model.target().fill.as_deref(), Some("previous"));
        assert!(model
            .render(false)
            .contains("GROUP BY time, \"host\", \"dc\" ORDER BY"));
    }

    #[test]
    fn test_add_group_by_replaces_time_and_fill() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();

        model.add_group_by("time(1h)").unwrap();
        model.add_group_by("fill(0)").unwrap();

        let names: Vec<_> = model.group_by_parts().iter().map(|p| p.kind()).collect();
        assert_eq!(names, vec![PartKind::Time, PartKind::Fill]);
        assert_eq!(model.target().interval.as_deref(), Some("1h"));
        assert_eq!(model.target().fill.as_deref(), Some("0"));

        let sql = model.render(false);
        assert!(sql.contains("DATE_BIN(INTERVAL '1h'"), "{}", sql);
        assert!(sql.contains("GROUP BY time ORDER BY"), "{}", sql);
    }

    #[test]
    fn test_add_group_by_into_empty_list() {
        let registry = PartRegistry::standard();
        let mut model =
            QueryModel::new(Query::new("cpu").with_group_by(vec![]), &registry).unwrap();

        model.add_group_by("tag(host)").unwrap();
        assert_eq!(model.group_by_parts().len(), 1);
    }

    #[test]
    fn test_add_group_by_malformed_is_noop() {
        let registry = PartRegistry::standard();
        let mut model = QueryModel::new(cpu_query(), &registry).unwrap();
        let before = model.target().clone();

        model.add_group_by("tag host").unwrap();
        model.add_group_by("").unwrap();

        assert_eq!(model.target(), &before);
        assert!(matches!(
            model.add_group_by("bucket(1h)"),
            Err(QueryError::UnknownPart(_))
        ));
    }

    #[test]
    fn test_custom_defaults() {
        let registry = PartRegistry::standard();
        let defaults = QueryDefaults::new("metrics", "usage", "max", "1 minute", "0");
        let model = QueryModel::with_defaults(Query::default(), &registry, &defaults).unwrap();

        assert_eq!(
            model.render(false),
            "SELECT DATE_BIN(INTERVAL '1 minute', time, TIMESTAMP '1970-01-01T00:00:00Z') AS time, max(\"usage\") \
             FROM \"metrics\" WHERE $timeFilter GROUP BY time ORDER BY time ASC"
        );
        assert_eq!(
            model.select_models()[0][1].category(),
            Category::Aggregations
        );
    }
}
