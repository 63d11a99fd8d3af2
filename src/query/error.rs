//! Query error types
//!
//! Defines all error conditions that can occur while building, editing and
//! rendering a query.

use thiserror::Error;

/// Errors that can occur during query operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A part references a type missing from the registry
    #[error("Unknown query part: {0}")]
    UnknownPart(String),

    /// Two definitions were registered for the same part type
    #[error("Duplicate part definition: {0}")]
    DuplicatePart(String),

    /// A persisted part does not match the shape of its definition
    #[error("Invalid query segment: {part} expects {expected} params, got {actual}")]
    InvalidSegment {
        part: String,
        expected: usize,
        actual: usize,
    },

    /// The part type cannot be added to a select list
    #[error("Part cannot be added to a select list: {0}")]
    NotSelectable(String),

    /// A position does not address an element of the current query
    #[error("Index out of range: {what} {index} (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Invalid time bound or interval specified
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    /// Persisted query could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Parse(err.to_string())
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::UnknownPart("median".to_string());
        assert_eq!(err.to_string(), "Unknown query part: median");

        let err = QueryError::InvalidSegment {
            part: "field".to_string(),
            expected: 1,
            actual: 0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid query segment: field expects 1 params, got 0"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: QueryError = json_err.into();
        assert!(matches!(err, QueryError::Parse(_)));
    }
}
