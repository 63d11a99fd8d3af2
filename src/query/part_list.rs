//! Part-list helpers
//!
//! Turns persisted parts into the list an editor displays: one entry per part
//! with each parameter's current value and where its choices come from.
//! Choices backed by metadata stay unresolved here; see
//! [`meta::resolve_part_list`](crate::meta::resolve_part_list).

use crate::query::error::{QueryError, QueryResult};
use crate::query::model::QueryModel;
use crate::query::registry::{DynamicLookup, PartRegistry};
use crate::query::types::{Query, SelectItem};
use serde::Serialize;

/// Tag key offered when the table's tag keys are unknown
pub const DEFAULT_TAG: &str = "default_tag";

/// One labelled group of the "add select part" menu
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionGroup {
    pub label: String,
    pub options: Vec<String>,
}

/// Where the choices of a parameter slot come from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "values", rename_all = "snake_case")]
pub enum ParamOptions {
    /// Free-form value
    None,
    /// Fixed list from the part definition
    Static(Vec<String>),
    /// Looked up from metadata on demand
    Dynamic(DynamicLookup),
}

/// Current value of a parameter slot and its choices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartParam {
    pub value: String,
    pub options: ParamOptions,
}

/// Display entry for one persisted part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartListEntry {
    pub name: String,
    pub params: Vec<PartParam>,
}

/// Menu of parts that can be added to a select list, grouped by category
pub fn new_select_part_options(registry: &PartRegistry) -> Vec<OptionGroup> {
    registry
        .categories()
        .into_iter()
        .map(|(category, defs)| OptionGroup {
            label: category.name().to_string(),
            options: defs.iter().map(|d| d.type_name().to_string()).collect(),
        })
        .collect()
}

/// Group-by parts that can still be added to `query`, as `name(args)` strings
/// accepted by [`QueryModel::add_group_by`]
pub fn new_group_by_part_options(
    query: &Query,
    registry: &PartRegistry,
    tag_keys: &[String],
) -> QueryResult<Vec<String>> {
    let model = QueryModel::new(query.clone(), registry)?;

    let mut options = Vec::new();
    if !model.has_fill() {
        options.push("fill(null)".to_string());
    }
    if !model.has_group_by_time() {
        options.push("time($interval)".to_string());
    }
    if tag_keys.is_empty() {
        options.push(format!("tag({})", DEFAULT_TAG));
    } else {
        options.extend(tag_keys.iter().map(|key| format!("tag({})", key)));
    }
    Ok(options)
}

/// Display entries for `parts`. Every part must carry exactly as many
/// parameters as its definition declares.
pub fn make_part_list(
    parts: &[SelectItem],
    registry: &PartRegistry,
) -> QueryResult<Vec<PartListEntry>> {
    parts
        .iter()
        .map(|item| {
            let def = registry.definition(&item.kind)?;
            if item.params().len() != def.params.len() {
                return Err(QueryError::InvalidSegment {
                    part: item.kind.clone(),
                    expected: def.params.len(),
                    actual: item.params().len(),
                });
            }

            let params = item
                .params()
                .iter()
                .zip(&def.params)
                .map(|(value, spec)| {
                    let options = match (&spec.dynamic, &spec.options) {
                        (Some(lookup), _) => ParamOptions::Dynamic(*lookup),
                        (None, Some(list)) => {
                            ParamOptions::Static(list.iter().map(|o| o.to_string()).collect())
                        }
                        (None, None) => ParamOptions::None,
                    };
                    PartParam {
                        value: value.to_string(),
                        options,
                    }
                })
                .collect();

            Ok(PartListEntry {
                name: item.kind.clone(),
                params,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::Scalar;

    #[test]
    fn test_select_part_options() {
        let registry = PartRegistry::standard();
        let groups = new_select_part_options(&registry);

        assert_eq!(groups.len(), 7);
        assert_eq!(groups[0].label, "Aggregations");
        assert!(groups[0].options.contains(&"distinct".to_string()));
        assert!(groups[1].options.is_empty());
        assert_eq!(groups[5].options, vec!["alias"]);
        assert_eq!(groups[6].options, vec!["field"]);
    }

    #[test]
    fn test_group_by_options_for_default_query() {
        let registry = PartRegistry::standard();
        let options = new_group_by_part_options(&Query::new("cpu"), &registry, &[]).unwrap();
        assert_eq!(options, vec!["tag(default_tag)"]);
    }

    #[test]
    fn test_group_by_options_without_time_or_fill() {
        let registry = PartRegistry::standard();
        let query = Query::new("cpu").with_group_by(vec![]);
        let keys = vec!["host".to_string(), "dc".to_string()];

        let options = new_group_by_part_options(&query, &registry, &keys).unwrap();

        assert_eq!(
            options,
            vec!["fill(null)", "time($interval)", "tag(host)", "tag(dc)"]
        );
    }

    #[test]
    fn test_make_part_list() {
        let registry = PartRegistry::standard();
        let parts = vec![
            SelectItem::field("usage"),
            SelectItem::function("max"),
            SelectItem::new("alias", vec![Scalar::from("peak")]),
        ];

        let list = make_part_list(&parts, &registry).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list[0].name, "field");
        assert_eq!(list[0].params[0].value, "usage");
        assert_eq!(
            list[0].params[0].options,
            ParamOptions::Dynamic(DynamicLookup::FieldNames)
        );
        assert!(list[1].params.is_empty());
        assert_eq!(list[2].params[0].options, ParamOptions::None);
    }

    #[test]
    fn test_make_part_list_static_options() {
        let registry = PartRegistry::standard();
        let parts = vec![
            SelectItem::new("time", vec![Scalar::from("$__interval")]),
            SelectItem::new("fill", vec![Scalar::from(0u64)]),
        ];

        let list = make_part_list(&parts, &registry).unwrap();

        let ParamOptions::Static(fill_options) = &list[1].params[0].options else {
            panic!("fill should offer static options");
        };
        assert_eq!(fill_options, &vec!["none", "null", "0", "previous"]);
        assert_eq!(list[1].params[0].value, "0");
        assert!(matches!(list[0].params[0].options, ParamOptions::Static(ref o) if o.len() == 8));
    }

    #[test]
    fn test_make_part_list_rejects_param_mismatch() {
        let registry = PartRegistry::standard();
        let parts = vec![SelectItem::function("field")];

        let result = make_part_list(&parts, &registry);

        assert_eq!(
            result,
            Err(QueryError::InvalidSegment {
                part: "field".to_string(),
                expected: 1,
                actual: 0,
            })
        );
    }

    #[test]
    fn test_part_list_serializes() {
        let registry = PartRegistry::standard();
        let list = make_part_list(&[SelectItem::new("tag", vec![Scalar::from("host")])], &registry)
            .unwrap();
        let json = serde_json::to_value(&list).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{
                "name": "tag",
                "params": [{"value": "host", "options": {"source": "dynamic", "values": "tag_keys"}}]
            }])
        );
    }
}
