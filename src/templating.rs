//! Template variable substitution
//!
//! The renderer never expands variables itself; it calls an [`Interpolator`]
//! supplied by the host. [`TemplateVariables`] is an in-memory implementation
//! used by the CLI and tests.
//!
//! Recognized references: `$name`, `${name}` and `[[name]]`. References to
//! unknown variables (such as `$timeFilter`) are left untouched.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

/// How a variable's value is formatted at the substitution site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableFormat {
    /// Values as-is; several values become a `{a,b}` glob
    Plain,
    /// Regex-escaped; several values become an `(a|b)` alternation
    Regex,
    /// Raw queries: only multi-value and include-all variables are
    /// regex-formatted, everything else is substituted as-is
    MultiRegex,
}

/// Variable substitution capability
pub trait Interpolator: Send + Sync {
    fn replace(&self, text: &str, format: VariableFormat) -> String;
}

/// Current value(s) of one dashboard variable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Variable {
    pub values: Vec<String>,
    pub multi: bool,
    pub include_all: bool,
}

impl Variable {
    /// A single-valued variable
    pub fn single(value: impl Into<String>) -> Self {
        Self {
            values: vec![value.into()],
            multi: false,
            include_all: false,
        }
    }

    /// A multi-value variable
    pub fn multi(values: Vec<String>) -> Self {
        Self {
            values,
            multi: true,
            include_all: false,
        }
    }

    fn format(&self, format: VariableFormat) -> String {
        match format {
            VariableFormat::Plain => glob(&self.values),
            VariableFormat::Regex => alternation(&self.values),
            VariableFormat::MultiRegex => {
                if self.multi || self.include_all {
                    alternation(&self.values)
                } else {
                    glob(&self.values)
                }
            }
        }
    }
}

fn glob(values: &[String]) -> String {
    match values {
        [single] => single.clone(),
        _ => format!("{{{}}}", values.join(",")),
    }
}

fn alternation(values: &[String]) -> String {
    match values {
        [single] => regex_escape(single),
        _ => {
            let escaped: Vec<String> = values.iter().map(|v| regex_escape(v)).collect();
            format!("({})", escaped.join("|"))
        }
    }
}

/// Escape regex metacharacters, including `/` so values fit inside `/.../`
pub fn regex_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '\\' | '^' | '$' | '*' | '+' | '?' | '.' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '/'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$(\w+)|\$\{(\w+)\}|\[\[(\w+)\]\]").expect("variable pattern is valid")
    })
}

/// In-memory variable set
#[derive(Debug, Clone, Default)]
pub struct TemplateVariables {
    vars: HashMap<String, Variable>,
}

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single-valued variable
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), Variable::single(value));
        self
    }

    /// Set a variable with full control over its flags
    pub fn insert(&mut self, name: impl Into<String>, variable: Variable) -> &mut Self {
        self.vars.insert(name.into(), variable);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Parse `name=value` assignments; `a|b` values make a multi-value variable
    pub fn from_assignments<I, S>(assignments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vars = Self::new();
        for assignment in assignments {
            let Some((name, value)) = assignment.as_ref().split_once('=') else {
                tracing::warn!("Ignoring malformed variable assignment: {}", assignment.as_ref());
                continue;
            };
            if value.contains('|') {
                vars.insert(name, Variable::multi(value.split('|').map(String::from).collect()));
            } else {
                vars.set(name, value);
            }
        }
        vars
    }
}

impl Interpolator for TemplateVariables {
    fn replace(&self, text: &str, format: VariableFormat) -> String {
        variable_regex()
            .replace_all(text, |caps: &Captures| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                match self.vars.get(name) {
                    Some(var) => var.format(format),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
