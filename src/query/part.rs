//! Query Part
//!
//! A persisted part resolved against its definition. Parts of one select list
//! render by folding left to right, each part wrapping the text produced by
//! the parts before it:
//!
//! ```text
//! field(value) -> "value"
//! avg()        -> avg("value")
//! alias(mean)  -> avg("value") AS "mean"
//! ```

use crate::query::registry::{Category, ParamType, PartDef, PartKind, Quote, Renderer};
use crate::query::types::{Scalar, SelectItem};

/// A typed node: parameters plus the definition that gives them meaning
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPart<'r> {
    def: &'r PartDef,
    pub params: Vec<Scalar>,
}

impl<'r> QueryPart<'r> {
    /// Bind parameters to a definition as given
    pub fn new(def: &'r PartDef, params: Vec<Scalar>) -> Self {
        Self { def, params }
    }

    pub fn def(&self) -> &'r PartDef {
        self.def
    }

    pub fn kind(&self) -> PartKind {
        self.def.kind
    }

    pub fn category(&self) -> Category {
        self.def.category
    }

    /// Render this part around the expression built by the preceding parts
    pub fn render(&self, inner: &str) -> String {
        match self.def.renderer {
            Renderer::Field => {
                let name = self.first_param();
                if name == "*" {
                    "*".to_string()
                } else {
                    format!("\"{}\"", name)
                }
            }
            Renderer::Function => {
                let mut args: Vec<String> = self
                    .params
                    .iter()
                    .enumerate()
                    .map(|(i, param)| self.render_param(i, param))
                    .collect();
                if !inner.is_empty() {
                    args.insert(0, inner.to_string());
                }
                format!("{}({})", self.def.type_name(), args.join(", "))
            }
            Renderer::Alias => format!("{} AS \"{}\"", inner, self.first_param()),
            Renderer::TimeColumn => "time".to_string(),
            Renderer::Empty => String::new(),
        }
    }

    /// Flatten back to the persisted shape
    pub fn to_item(&self) -> SelectItem {
        SelectItem::new(self.def.type_name(), self.params.clone())
    }

    fn first_param(&self) -> String {
        self.params.first().map(|p| p.to_string()).unwrap_or_default()
    }

    fn render_param(&self, index: usize, param: &Scalar) -> String {
        let mut value = param.to_string();
        let Some(spec) = self.def.params.get(index) else {
            return value;
        };

        if spec.kind == ParamType::Time && value == "auto" {
            value = "$__interval".to_string();
        }

        match spec.quote {
            Some(Quote::Single) => format!("'{}'", value),
            Some(Quote::Double) => format!("\"{}\"", value),
            None => value,
        }
    }
}

/// Fold a select list into one column expression
pub fn render_select_list(parts: &[QueryPart<'_>]) -> String {
    parts
        .iter()
        .fold(String::new(), |inner, part| part.render(&inner))
}
