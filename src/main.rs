//! CnoSQL CLI
//!
//! Command-line interface over the query builder:
//! - Render a stored query to SQL
//! - Fill a stored query's defaults
//! - List the parts a select list can take
//! - Show a select list's part editor entries

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use cnosql::config::{generate_default_config, Config};
use cnosql::meta::{resolve_part_list, MetadataSource, StaticMetadata};
use cnosql::query::{
    make_part_list, new_group_by_part_options, new_select_part_options, PartRegistry, Query,
    QueryModel,
};
use cnosql::templating::TemplateVariables;
use cnosql::time_filter::{apply_time_filter, render_time_filter};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cnosql")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build and render CnosDB time-series queries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a stored query to SQL
    Render {
        /// Query JSON file
        file: PathBuf,
        /// Substitute template variables
        #[arg(short, long)]
        interpolate: bool,
        /// Template variables in name=value format; a|b makes a multi-value variable
        #[arg(short, long = "var")]
        vars: Vec<String>,
        /// Range start (e.g. now-6h, now-7d/d, now-1M, epoch ms, RFC 3339); requires --to
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Range end; a rounded bound such as now/d covers the whole unit
        #[arg(long, requires = "from")]
        to: Option<String>,
    },

    /// Print a stored query with its defaults filled
    Normalize {
        /// Query JSON file
        file: PathBuf,
    },

    /// List the parts that can be added to a select list
    Parts,

    /// Show the part editor entries of one select list
    Options {
        /// Query JSON file
        file: PathBuf,
        /// Select list index
        #[arg(short, long, default_value = "0")]
        list: usize,
        /// Schema JSON used to resolve field and tag choices
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config);

    let registry = PartRegistry::standard();
    let defaults = config.query_defaults();

    match cli.command {
        Commands::Render {
            file,
            interpolate,
            vars,
            from,
            to,
        } => {
            let query = read_query(&file).await?;
            let vars = TemplateVariables::from_assignments(&vars);
            let model = QueryModel::with_defaults(query, &registry, &defaults)?
                .with_interpolator(&vars);

            let mut sql = model.render(interpolate);
            if let (Some(from), Some(to)) = (from, to) {
                let filter = render_time_filter(&from, &to)?;
                sql = apply_time_filter(&sql, &filter);
            }
            println!("{}", sql);
        }

        Commands::Normalize { file } => {
            let query = read_query(&file).await?;
            let model = QueryModel::with_defaults(query, &registry, &defaults)?;
            println!("{}", serde_json::to_string_pretty(&model.into_query())?);
        }

        Commands::Parts => {
            for group in new_select_part_options(&registry) {
                if group.options.is_empty() {
                    continue;
                }
                println!("{}: {}", group.label, group.options.join(", "));
            }
        }

        Commands::Options { file, list, schema } => {
            let query = read_query(&file).await?;
            let model = QueryModel::with_defaults(query, &registry, &defaults)?;
            let query = model.target();

            let select = query.select.as_deref().unwrap_or_default();
            let Some(parts) = select.get(list) else {
                bail!("Select list {} out of range ({} lists)", list, select.len());
            };
            let entries = make_part_list(parts, &registry)?;

            let output = match schema {
                Some(path) => {
                    let source = StaticMetadata::load(&path)
                        .await
                        .with_context(|| format!("Failed to load schema {:?}", path))?;
                    let table = model.table_name();
                    let tags = query.tags.as_deref().unwrap_or_default();
                    let resolved = resolve_part_list(&entries, &source, table, tags).await?;

                    let tag_keys = source.tag_keys(table, tags).await.unwrap_or_else(|e| {
                        tracing::warn!("No tag keys for {}: {}", table, e);
                        Vec::new()
                    });
                    let group_by = new_group_by_part_options(query, &registry, &tag_keys)?;

                    serde_json::json!({ "select": resolved, "groupBy": group_by })
                }
                None => {
                    let group_by = new_group_by_part_options(query, &registry, &[])?;
                    serde_json::json!({ "select": entries, "groupBy": group_by })
                }
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    tokio::fs::write(&path, content)
                        .await
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cnosql={}", config.logging.level)));
    let json = config.logging.format == "json";

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn read_query(path: &Path) -> anyhow::Result<Query> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    let query = Query::from_json(&content).with_context(|| format!("Invalid query {:?}", path))?;
    tracing::debug!("Loaded query from {:?}", path);
    Ok(query)
}
