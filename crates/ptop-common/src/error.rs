//! Error types for prom-top.

use thiserror::Error;

/// Result type alias for prom-top operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for prom-top.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid config file: {0}")]
    InvalidConfig(String),

    // Composition errors (20-29)
    #[error("query composition failed: {0}")]
    Composition(String),

    // Query execution errors (30-39)
    #[error("query {query:?} failed: {message}")]
    QueryFailed { query: String, message: String },

    #[error("query {query:?} returned {found}, expected vector")]
    UnexpectedResultType { query: String, found: String },

    #[error("run cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::Composition(_) => 20,
            Error::QueryFailed { .. } => 30,
            Error::UnexpectedResultType { .. } => 31,
            Error::Cancelled => 32,
            Error::DeadlineExceeded => 33,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_category() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(Error::Composition("x".into()).code(), 20);
        assert_eq!(Error::Cancelled.code(), 32);
        assert_eq!(
            Error::UnexpectedResultType {
                query: "up".into(),
                found: "matrix".into()
            }
            .code(),
            31
        );
    }

    #[test]
    fn query_failure_names_the_query() {
        let err = Error::QueryFailed {
            query: "avg_over_time(x[10m])".into(),
            message: "bad_data".into(),
        };
        assert!(err.to_string().contains("avg_over_time(x[10m])"));
    }
}
