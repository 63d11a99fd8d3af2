//! Tag predicate helpers
//!
//! Operator and connective inference shared by the WHERE-clause renderer and
//! by editors that let users change a predicate.

use crate::query::types::TagItem;
use regex::Regex;
use std::sync::OnceLock;

/// Connective used when a predicate does not name one
pub const DEFAULT_CONDITION: &str = "AND";

fn regex_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/.*/$").expect("regex literal pattern is valid"))
}

/// Whether `text` is a `/regex/` literal
pub fn is_regex(text: &str) -> bool {
    regex_literal().is_match(text)
}

/// Whether `operator` matches against a regex
pub fn is_regex_operator(operator: &str) -> bool {
    operator == "=~" || operator == "!~"
}

/// Explicit operator, or `=~` for regex values and `=` otherwise
pub fn operator_for(tag: &TagItem) -> String {
    match tag.operator.as_deref() {
        Some(op) if !op.is_empty() => op.to_string(),
        _ if is_regex(&tag.value) => "=~".to_string(),
        _ => "=".to_string(),
    }
}

/// Connective to the previous predicate; the first predicate has none
pub fn condition_for(tag: &TagItem, is_first: bool) -> Option<String> {
    if is_first {
        return None;
    }
    let condition = tag
        .condition
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CONDITION);
    Some(condition.to_string())
}

/// Operator to use after a predicate's value changed to `new_value`.
///
/// Switching to a regex value moves a non-regex operator to `=~`; switching
/// away from a regex value moves a regex operator to `=`.
pub fn adjust_operator(current: &str, new_value: &str) -> String {
    let current_is_regex = is_regex_operator(current);
    if is_regex(new_value) {
        if current_is_regex {
            current.to_string()
        } else {
            "=~".to_string()
        }
    } else if current_is_regex {
        "=".to_string()
    } else {
        current.to_string()
    }
}

/// Single-quote a string literal, escaping backslashes and quotes
pub fn quote_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_regex() {
        assert!(is_regex("/^prod.*/"));
        assert!(is_regex("//"));
        assert!(!is_regex("/"));
        assert!(!is_regex("prod"));
        assert!(!is_regex("/prod"));
    }

    #[test]
    fn test_operator_inference() {
        assert_eq!(operator_for(&TagItem::new("host", "a")), "=");
        assert_eq!(operator_for(&TagItem::new("host", "/a.*/")), "=~");
        assert_eq!(operator_for(&TagItem::new("host", "/a/").operator("!~")), "!~");
        assert_eq!(operator_for(&TagItem::new("cpu", "5").operator("")), "=");
    }

    #[test]
    fn test_condition_for() {
        let tag = TagItem::new("host", "a");
        assert_eq!(condition_for(&tag, true), None);
        assert_eq!(condition_for(&tag, false).as_deref(), Some("AND"));
        assert_eq!(
            condition_for(&tag.clone().condition("OR"), false).as_deref(),
            Some("OR")
        );
    }

    #[test]
    fn test_adjust_operator() {
        assert_eq!(adjust_operator("=", "/x/"), "=~");
        assert_eq!(adjust_operator("!~", "/x/"), "!~");
        assert_eq!(adjust_operator("=~", "x"), "=");
        assert_eq!(adjust_operator("<>", "x"), "<>");
    }

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value("it's"), "'it\\'s'");
        assert_eq!(quote_value("a\\b"), "'a\\\\b'");
        assert_eq!(quote_value("plain"), "'plain'");
    }
}
