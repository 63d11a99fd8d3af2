//! Functional edits
//!
//! Each helper takes a persisted query by reference and returns an edited
//! copy, leaving the input untouched. Helpers that need the part semantics go
//! through a [`QueryModel`]; parameter changes only touch the addressed item.

use crate::query::error::{QueryError, QueryResult};
use crate::query::model::QueryModel;
use crate::query::registry::PartRegistry;
use crate::query::types::{Query, Scalar};

/// Render `query` without variable substitution
pub fn build_raw_query(query: &Query, registry: &PartRegistry) -> QueryResult<String> {
    let model = QueryModel::new(query.clone(), registry)?;
    Ok(model.render(false))
}

/// Fill missing defaults. A query with nothing missing comes back unchanged.
pub fn normalize_query(query: &Query, registry: &PartRegistry) -> QueryResult<Query> {
    if query.order_by_time.is_some()
        && query.tags.is_some()
        && query.group_by.is_some()
        && query.select.is_some()
    {
        return Ok(query.clone());
    }
    Ok(QueryModel::new(query.clone(), registry)?.into_query())
}

/// Add a part of type `kind` to select list `list`
pub fn add_new_select_part(
    query: &Query,
    registry: &PartRegistry,
    kind: &str,
    list: usize,
) -> QueryResult<Query> {
    let mut model = QueryModel::new(query.clone(), registry)?;
    model.add_select_part(list, kind)?;
    Ok(model.into_query())
}

/// Remove part `part` of select list `list`
pub fn remove_select_part(
    query: &Query,
    registry: &PartRegistry,
    list: usize,
    part: usize,
) -> QueryResult<Query> {
    let mut model = QueryModel::new(query.clone(), registry)?;
    model.remove_select_part(list, part)?;
    Ok(model.into_query())
}

/// Replace the parameters of part `part` of select list `list`
pub fn change_select_part(
    query: &Query,
    list: usize,
    part: usize,
    params: Vec<Scalar>,
) -> QueryResult<Query> {
    let mut query = query.clone();
    let select = query.select.get_or_insert_with(Vec::new);
    let len = select.len();
    let parts = select.get_mut(list).ok_or(QueryError::IndexOutOfRange {
        what: "select list",
        index: list,
        len,
    })?;
    let len = parts.len();
    let item = parts.get_mut(part).ok_or(QueryError::IndexOutOfRange {
        what: "select part",
        index: part,
        len,
    })?;
    item.params = Some(params);
    Ok(query)
}

/// Add a group-by part given as `name(args)`
pub fn add_new_group_by_part(
    query: &Query,
    registry: &PartRegistry,
    value: &str,
) -> QueryResult<Query> {
    let mut model = QueryModel::new(query.clone(), registry)?;
    model.add_group_by(value)?;
    Ok(model.into_query())
}

/// Remove group-by part `index`
pub fn remove_group_by_part(
    query: &Query,
    registry: &PartRegistry,
    index: usize,
) -> QueryResult<Query> {
    let mut model = QueryModel::new(query.clone(), registry)?;
    model.remove_group_by_part(index)?;
    Ok(model.into_query())
}

/// Replace the parameters of group-by part `index`
pub fn change_group_by_part(query: &Query, index: usize, params: Vec<Scalar>) -> QueryResult<Query> {
    let mut query = query.clone();
    let group_by = query.group_by.get_or_insert_with(Vec::new);
    let len = group_by.len();
    let item = group_by.get_mut(index).ok_or(QueryError::IndexOutOfRange {
        what: "group by part",
        index,
        len,
    })?;
    item.params = Some(params);
    Ok(query)
}
