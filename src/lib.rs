//! # CnoSQL
//!
//! Visual query builder for CnosDB time-series queries: an editable model of
//! a dashboard query, a registry of the parts a query is built from, and a
//! renderer producing CnosDB SQL with `DATE_BIN` time bucketing.
//!
//! ## Modules
//!
//! - [`query`]: persisted query types, part registry, query model and renderer
//! - [`templating`]: dashboard variable substitution
//! - [`time_filter`]: the `$timeFilter` predicate and interval parsing
//! - [`meta`]: schema lookups behind dynamic part parameters
//! - [`config`]: defaults for new queries and logging settings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cnosql::query::{PartRegistry, Query, QueryModel, TagItem};
//! use cnosql::time_filter::{apply_time_filter, render_time_filter};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = PartRegistry::standard();
//!
//!     let query = Query::new("cpu").with_tag(TagItem::new("host", "server1"));
//!     let mut model = QueryModel::new(query, &registry)?;
//!     model.add_select_part(0, "max")?;
//!     model.add_group_by("tag(host)")?;
//!
//!     let sql = model.render(false);
//!     let sql = apply_time_filter(&sql, &render_time_filter("now-6h", "now")?);
//!     println!("{}", sql);
//!
//!     // Hand the edited query back for storage
//!     let stored = serde_json::to_string(&model.into_query())?;
//!     println!("{}", stored);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod meta;
pub mod query;
pub mod templating;
pub mod time_filter;

// Re-export top-level types for convenience
pub use query::{
    Category, OrderByTime, PartKind, PartRegistry, Query, QueryDefaults, QueryError, QueryModel,
    QueryResult, Scalar, SelectItem, TagItem,
};

pub use templating::{Interpolator, TemplateVariables, Variable, VariableFormat};

pub use time_filter::{apply_time_filter, parse_interval, render_time_filter, TimeBound, TimeUnit};

pub use meta::{MetaQuery, MetadataError, MetadataResult, MetadataSource, StaticMetadata};

pub use config::{Config, ConfigError, LoggingConfig, QueryConfig};
