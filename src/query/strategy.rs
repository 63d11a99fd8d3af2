//! Add strategies
//!
//! Merge policies applied when a part is added to a select list. Each
//! [`AddStrategy`] variant maps to one function here.

use crate::query::part::QueryPart;
use crate::query::registry::{AddStrategy, Category, PartKind};

/// Apply `strategy` to the select list at `list`. The caller guarantees
/// `list` is in range.
pub fn apply<'r>(
    strategy: AddStrategy,
    select_models: &mut Vec<Vec<QueryPart<'r>>>,
    list: usize,
    part: QueryPart<'r>,
) {
    match strategy {
        AddStrategy::NewSelectList => add_field(select_models, list),
        AddStrategy::ReplaceAggregation => replace_aggregation(&mut select_models[list], part),
        AddStrategy::AppendOrReplaceAlias => add_alias(&mut select_models[list], part),
    }
}

/// Duplicate the select list at `list` as a new output column
pub fn add_field(select_models: &mut Vec<Vec<QueryPart<'_>>>, list: usize) {
    if let Some(parts) = select_models.get(list) {
        let copy = parts.clone();
        select_models.push(copy);
    }
}

/// Put `new` in place of the list's aggregation.
///
/// Scans for the first aggregation or selector:
/// - same type: nothing changes
/// - existing `count`, new `distinct`: `distinct` goes in front of `count`
/// - existing `distinct`, new `count`: `count` goes right after `distinct`
///   unless already there
/// - existing `distinct`, new other: a trailing aggregation after `distinct`
///   is dropped, then `distinct` is overwritten
/// - anything else is overwritten
///
/// Without an aggregation, `new` is inserted right after the field.
pub fn replace_aggregation<'r>(parts: &mut Vec<QueryPart<'r>>, new: QueryPart<'r>) {
    for i in 0..parts.len() {
        let kind = parts[i].kind();
        match parts[i].category() {
            Category::Aggregations => {
                if kind == new.kind() {
                    return;
                }
                if kind == PartKind::Count && new.kind() == PartKind::Distinct {
                    break;
                }
                if kind == PartKind::Distinct {
                    let has_next = parts.len() > i + 1;
                    if new.kind() != PartKind::Count && has_next {
                        if parts[i + 1].category() == Category::Aggregations {
                            parts.remove(i + 1);
                        }
                    } else if new.kind() == PartKind::Count {
                        if !has_next || parts[i + 1].kind() != PartKind::Count {
                            parts.insert(i + 1, new);
                        }
                        return;
                    }
                }
                parts[i] = new;
                return;
            }
            Category::Selectors => {
                parts[i] = new;
                return;
            }
            _ => {}
        }
    }

    let at = parts.len().min(1);
    parts.insert(at, new);
}

/// Replace a trailing alias, otherwise append
pub fn add_alias<'r>(parts: &mut Vec<QueryPart<'r>>, new: QueryPart<'r>) {
    if let Some(last) = parts.last_mut() {
        if last.kind() == PartKind::Alias {
            *last = new;
            return;
        }
    }
    parts.push(new);
}
