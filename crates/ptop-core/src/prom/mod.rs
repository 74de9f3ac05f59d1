//! Metrics backend access: query interface, evaluation context, HTTP client.

pub mod api;
pub mod client;
pub mod context;
pub mod wire;

pub use api::{ApiError, Labels, QueryApi, QueryResponse, QueryValue, RangeSeries, Sample};
pub use client::PrometheusClient;
pub use context::{CancelHandle, ContextError, EvalContext};
