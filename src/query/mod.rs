//! CnoSQL Query Builder
//!
//! Structured editing and rendering of time-series queries:
//!
//! - **Types**: the persisted JSON query shape
//! - **Registry**: part definitions (categories, params, add strategies)
//! - **Model**: edit operations that keep the query consistent, and `render`
//! - **Part lists**: display helpers for query editors
//!
//! # Rendered Shape
//!
//! ```text
//! SELECT <time>, <column> [, <column> ...]
//! FROM "<table>"
//! WHERE (<tag conditions>) AND $timeFilter
//! [GROUP BY time, "<tag>" ...]
//! ORDER BY time ASC|DESC
//! [LIMIT n]
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use cnosql::query::{PartRegistry, Query, QueryModel, TagItem};
//!
//! let registry = PartRegistry::standard();
//! let query = Query::new("cpu").with_tag(TagItem::new("host", "server1"));
//!
//! let mut model = QueryModel::new(query, &registry)?;
//! model.add_select_part(0, "max")?;
//! model.add_group_by("tag(host)")?;
//!
//! let sql = model.render(false);
//! ```

pub mod edit;
mod error;
mod model;
pub mod part_list;
mod part;
mod projection;
mod registry;
mod render;
mod strategy;
pub mod tag;
mod types;

pub use error::{QueryError, QueryResult};
pub use model::{QueryDefaults, QueryModel};
pub use part::{render_select_list, QueryPart};
pub use part_list::{
    make_part_list, new_group_by_part_options, new_select_part_options, OptionGroup, ParamOptions,
    PartListEntry, PartParam,
};
pub use projection::{project, Projection, ProjectionPatch, TIME_COLUMN};
pub use registry::{
    AddStrategy, Category, DynamicLookup, ParamSpec, ParamType, PartDef, PartKind, PartRegistry,
    Quote, Renderer,
};
pub use render::{render_conditions, time_bucket, DEFAULT_TABLE, TIME_FILTER};
pub use types::{OrderByTime, Query, Scalar, SelectItem, TagItem};
