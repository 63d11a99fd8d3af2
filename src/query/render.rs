//! SQL rendering helpers
//!
//! Clause-level renderers used by [`QueryModel::render`](crate::query::QueryModel::render).
//! An `interpolator` argument of `None` means "do not substitute variables".

use crate::query::tag::{condition_for, is_regex, is_regex_operator, operator_for, quote_value};
use crate::query::types::TagItem;
use crate::templating::{Interpolator, VariableFormat};

/// Placeholder the caller replaces with the time-range predicate
pub const TIME_FILTER: &str = "$timeFilter";

/// Table used when the query names none
pub const DEFAULT_TABLE: &str = "default_table";

/// Time-bucketing expression for an interval, aliased as the time column
pub fn time_bucket(interval: &str) -> String {
    format!(
        "DATE_BIN(INTERVAL '{}', time, TIMESTAMP '1970-01-01T00:00:00Z') AS time",
        interval
    )
}

/// One WHERE-clause predicate. Every predicate after the first is prefixed
/// with its connective.
pub fn render_tag_condition(
    tag: &TagItem,
    index: usize,
    interpolator: Option<&dyn Interpolator>,
) -> String {
    let mut out = String::new();
    if let Some(condition) = condition_for(tag, index == 0) {
        out.push_str(&condition);
        out.push(' ');
    }

    let operator = operator_for(tag);
    let value = if is_regex_operator(&operator) {
        match interpolator {
            Some(i) => i.replace(&tag.value, VariableFormat::Regex),
            None => tag.value.clone(),
        }
    } else {
        let value = match interpolator {
            Some(i) => i.replace(&tag.value, VariableFormat::Plain),
            None => tag.value.clone(),
        };
        if operator == ">" || operator == "<" {
            value
        } else {
            quote_value(&value)
        }
    };

    out.push_str(&format!("\"{}\" {} {}", tag.key, operator, value));
    out
}

/// Predicates joined by their own connectives
pub fn render_conditions(tags: &[TagItem], interpolator: Option<&dyn Interpolator>) -> String {
    tags.iter()
        .enumerate()
        .map(|(index, tag)| render_tag_condition(tag, index, interpolator))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quoted table name; `/regex/` tables stay bare
pub fn render_table(table: &str, interpolator: Option<&dyn Interpolator>) -> String {
    if !is_regex(table) {
        return format!("\"{}\"", table);
    }
    match interpolator {
        Some(i) => i.replace(table, VariableFormat::Regex),
        None => table.to_string(),
    }
}
