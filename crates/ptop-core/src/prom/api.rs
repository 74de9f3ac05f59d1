//! Query interface consumed by the collector.

use super::context::{ContextError, EvalContext};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Series label set.
pub type Labels = BTreeMap<String, String>;

/// One element of an instant vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Labels,
    pub value: f64,
    pub timestamp_ms: i64,
}

impl Sample {
    /// Label value, or the empty string when the label is absent.
    pub fn label(&self, name: &str) -> &str {
        self.labels.get(name).map(String::as_str).unwrap_or("")
    }
}

/// One series of a range vector.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSeries {
    pub labels: Labels,
    pub values: Vec<(i64, f64)>,
}

/// Result value of an instant query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Vector(Vec<Sample>),
    Scalar { timestamp_ms: i64, value: f64 },
    Matrix(Vec<RangeSeries>),
    String { timestamp_ms: i64, value: String },
}

impl QueryValue {
    /// Prometheus `resultType` name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            QueryValue::Vector(_) => "vector",
            QueryValue::Scalar { .. } => "scalar",
            QueryValue::Matrix(_) => "matrix",
            QueryValue::String { .. } => "string",
        }
    }
}

/// Value plus the non-fatal warnings the backend attached.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub value: QueryValue,
    pub warnings: Vec<String>,
}

impl QueryResponse {
    pub fn new(value: QueryValue) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }
}

/// Errors from the query interface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend error ({error_type}): {message}")]
    Backend { error_type: String, message: String },

    #[error("undecodable response: {0}")]
    Decode(String),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Instant-query interface of a metrics backend.
pub trait QueryApi {
    /// Evaluate `query` at instant `at`.
    fn query(
        &self,
        ctx: &EvalContext,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryResponse, ApiError>;
}

impl<T: QueryApi + ?Sized> QueryApi for &T {
    fn query(
        &self,
        ctx: &EvalContext,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryResponse, ApiError> {
        (**self).query(ctx, query, at)
    }
}

impl<T: QueryApi + ?Sized> QueryApi for Box<T> {
    fn query(
        &self,
        ctx: &EvalContext,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryResponse, ApiError> {
        (**self).query(ctx, query, at)
    }
}
