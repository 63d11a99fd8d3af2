//! Part Definition Registry
//!
//! Static metadata for every part type the builder knows: its category, the
//! shape of its parameters, how it renders and how it merges into an existing
//! select list. The registry is built once with [`PartRegistry::standard`] and
//! then shared by reference; it is never mutated after startup.
//!
//! # Built-in parts
//!
//! ```text
//! field                          Fields        field(value)        new select list
//! avg count distinct min max     Aggregations  avg()               replace aggregation
//! sum stddev variance
//! time                           GroupBy       time($__interval)   positional
//! fill                           GroupBy       fill(null)          positional
//! tag                            GroupBy       tag(tag)            positional
//! alias                          Aliasing      alias(alias)        append or replace last
//! ```

use crate::query::error::{QueryError, QueryResult};
use crate::query::part::QueryPart;
use crate::query::types::{Scalar, SelectItem};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Bucket a part definition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Aggregations,
    Selectors,
    Transformations,
    Predictors,
    Math,
    Aliasing,
    Fields,
    /// Parts only valid in GROUP BY; never offered in the select menu
    GroupBy,
}

impl Category {
    /// Categories shown in the "add select part" menu, in display order
    pub const MENU: [Category; 7] = [
        Category::Aggregations,
        Category::Selectors,
        Category::Transformations,
        Category::Predictors,
        Category::Math,
        Category::Aliasing,
        Category::Fields,
    ];

    /// Aggregations and selectors: at most one per select list, and they
    /// require grouping by time
    pub fn is_primary(self) -> bool {
        matches!(self, Self::Aggregations | Self::Selectors)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Aggregations => "Aggregations",
            Self::Selectors => "Selectors",
            Self::Transformations => "Transformations",
            Self::Predictors => "Predictors",
            Self::Math => "Math",
            Self::Aliasing => "Aliasing",
            Self::Fields => "Fields",
            Self::GroupBy => "GroupBy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Every part type the builder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Field,
    Avg,
    Count,
    Distinct,
    Min,
    Max,
    Sum,
    Stddev,
    Variance,
    Time,
    Fill,
    Tag,
    Alias,
}

impl PartKind {
    pub const ALL: [PartKind; 13] = [
        PartKind::Field,
        PartKind::Avg,
        PartKind::Count,
        PartKind::Distinct,
        PartKind::Min,
        PartKind::Max,
        PartKind::Sum,
        PartKind::Stddev,
        PartKind::Variance,
        PartKind::Time,
        PartKind::Fill,
        PartKind::Tag,
        PartKind::Alias,
    ];

    /// Persisted type name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Distinct => "distinct",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
            Self::Stddev => "stddev",
            Self::Variance => "variance",
            Self::Time => "time",
            Self::Fill => "fill",
            Self::Tag => "tag",
            Self::Alias => "alias",
        }
    }
}

impl FromStr for PartKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| QueryError::UnknownPart(s.to_string()))
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic type of a parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Field,
    String,
    Time,
}

/// Metadata lookup that supplies the values of a dynamic parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicLookup {
    FieldNames,
    TagKeys,
}

/// Quoting applied by the function renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Single,
    Double,
}

/// Shape of one parameter slot
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub dynamic: Option<DynamicLookup>,
    pub options: Option<Vec<&'static str>>,
    pub quote: Option<Quote>,
}

impl ParamSpec {
    pub fn new(name: &'static str, kind: ParamType) -> Self {
        Self {
            name,
            kind,
            dynamic: None,
            options: None,
            quote: None,
        }
    }

    /// Values come from a metadata lookup
    pub fn dynamic(mut self, lookup: DynamicLookup) -> Self {
        self.dynamic = Some(lookup);
        self
    }

    /// Values come from a fixed list
    pub fn options(mut self, options: &[&'static str]) -> Self {
        self.options = Some(options.to_vec());
        self
    }

    pub fn quote(mut self, quote: Quote) -> Self {
        self.quote = Some(quote);
        self
    }
}

/// How a part turns into SQL text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// `"name"`, or `*` verbatim; ignores the inner expression
    Field,
    /// `type(inner, params...)`
    Function,
    /// `inner AS "name"`
    Alias,
    /// The bucketed time column alias produced by the SELECT clause
    TimeColumn,
    /// Contributes nothing to the statement
    Empty,
}

/// Merge policy when a part is added to an existing select list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddStrategy {
    /// Duplicate the current select list as a new output column
    NewSelectList,
    /// Replace the list's aggregation, honoring the count/distinct pair
    ReplaceAggregation,
    /// Replace a trailing alias or append
    AppendOrReplaceAlias,
}

/// Immutable definition of a part type
#[derive(Debug, Clone, PartialEq)]
pub struct PartDef {
    pub kind: PartKind,
    pub category: Category,
    pub params: Vec<ParamSpec>,
    pub default_params: Vec<Scalar>,
    pub renderer: Renderer,
    pub add_strategy: Option<AddStrategy>,
}

impl PartDef {
    pub fn new(kind: PartKind, category: Category, renderer: Renderer) -> Self {
        Self {
            kind,
            category,
            params: Vec::new(),
            default_params: Vec::new(),
            renderer,
            add_strategy: None,
        }
    }

    /// Append a parameter slot
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn defaults(mut self, defaults: &[&str]) -> Self {
        self.default_params = defaults.iter().map(|d| Scalar::from(*d)).collect();
        self
    }

    pub fn add_strategy(mut self, strategy: AddStrategy) -> Self {
        self.add_strategy = Some(strategy);
        self
    }

    /// Type name as persisted
    pub fn type_name(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Lookup table from part type to definition, grouped by category
#[derive(Debug, Clone, Default)]
pub struct PartRegistry {
    defs: HashMap<PartKind, PartDef>,
    categories: HashMap<Category, Vec<PartKind>>,
}

impl PartRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in part
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for def in standard_definitions() {
            // Built-in kinds are distinct, so this cannot collide
            if let Err(e) = registry.register(def) {
                tracing::error!("Built-in part registration failed: {}", e);
            }
        }
        registry
    }

    /// Add a definition; a second definition for the same kind is rejected
    pub fn register(&mut self, def: PartDef) -> QueryResult<()> {
        if self.defs.contains_key(&def.kind) {
            return Err(QueryError::DuplicatePart(def.kind.to_string()));
        }

        self.categories.entry(def.category).or_default().push(def.kind);
        self.defs.insert(def.kind, def);
        Ok(())
    }

    /// Definition of a known kind
    pub fn get(&self, kind: PartKind) -> Option<&PartDef> {
        self.defs.get(&kind)
    }

    /// Definition for a persisted type name
    pub fn definition(&self, type_name: &str) -> QueryResult<&PartDef> {
        let kind: PartKind = type_name.parse()?;
        self.get(kind)
            .ok_or_else(|| QueryError::UnknownPart(type_name.to_string()))
    }

    /// Resolve a persisted part against its definition. A part stored
    /// without parameters takes the definition's defaults.
    pub fn create(&self, item: &SelectItem) -> QueryResult<QueryPart<'_>> {
        let def = self.definition(&item.kind).map_err(|e| {
            tracing::warn!(part = %item.kind, "Unexpected query part");
            e
        })?;
        let params = item
            .params
            .clone()
            .unwrap_or_else(|| def.default_params.clone());
        Ok(QueryPart::new(def, params))
    }

    /// Menu categories with their definitions, in registration order
    pub fn categories(&self) -> Vec<(Category, Vec<&PartDef>)> {
        Category::MENU
            .iter()
            .map(|category| {
                let defs = self
                    .categories
                    .get(category)
                    .map(|kinds| kinds.iter().filter_map(|k| self.defs.get(k)).collect())
                    .unwrap_or_default();
                (*category, defs)
            })
            .collect()
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

const TIME_OPTIONS: [&str; 8] = [
    "$__interval",
    "1 second",
    "10 seconds",
    "1 minute",
    "5 minutes",
    "10 minutes",
    "15 minutes",
    "1 hour",
];

const FILL_OPTIONS: [&str; 4] = ["none", "null", "0", "previous"];

fn aggregation(kind: PartKind) -> PartDef {
    PartDef::new(kind, Category::Aggregations, Renderer::Function)
        .add_strategy(AddStrategy::ReplaceAggregation)
}

fn standard_definitions() -> Vec<PartDef> {
    vec![
        PartDef::new(PartKind::Field, Category::Fields, Renderer::Field)
            .param(ParamSpec::new("field", ParamType::Field).dynamic(DynamicLookup::FieldNames))
            .defaults(&["value"])
            .add_strategy(AddStrategy::NewSelectList),
        aggregation(PartKind::Avg),
        aggregation(PartKind::Count),
        aggregation(PartKind::Distinct),
        aggregation(PartKind::Min),
        aggregation(PartKind::Max),
        aggregation(PartKind::Sum),
        aggregation(PartKind::Stddev),
        aggregation(PartKind::Variance),
        PartDef::new(PartKind::Time, Category::GroupBy, Renderer::TimeColumn)
            .param(ParamSpec::new("interval", ParamType::Time).options(&TIME_OPTIONS))
            .defaults(&["$__interval"]),
        PartDef::new(PartKind::Fill, Category::GroupBy, Renderer::Empty)
            .param(ParamSpec::new("fill", ParamType::String).options(&FILL_OPTIONS))
            .defaults(&["null"]),
        PartDef::new(PartKind::Tag, Category::GroupBy, Renderer::Field)
            .param(ParamSpec::new("tag", ParamType::String).dynamic(DynamicLookup::TagKeys))
            .defaults(&["tag"]),
        PartDef::new(PartKind::Alias, Category::Aliasing, Renderer::Alias)
            .param(ParamSpec::new("name", ParamType::String).quote(Quote::Double))
            .defaults(&["alias"])
            .add_strategy(AddStrategy::AppendOrReplaceAlias),
    ]
}
