use crate::compose::ComposedQuery;
use crate::prom::{ApiError, ContextError, EvalContext, QueryApi, QueryValue, Sample};
use chrono::{DateTime, Utc};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that abort a collection pass.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("query {query:?} failed: {source}")]
    Query {
        query: String,
        #[source]
        source: ApiError,
    },

    #[error("query {query:?} returned {found}, expected vector")]
    UnexpectedResultType { query: String, found: &'static str },

    #[error(transparent)]
    Context(#[from] ContextError),
}

impl CollectError {
    /// Query string the error is attributed to, if any.
    pub fn query(&self) -> Option<&str> {
        match self {
            CollectError::Query { query, .. } | CollectError::UnexpectedResultType { query, .. } => {
                Some(query.as_str())
            }
            CollectError::Context(_) => None,
        }
    }
}

/// Result of one executed query, still tagged with what produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedVector {
    pub query: ComposedQuery,
    pub samples: Vec<Sample>,
    pub warnings: Vec<String>,
}

/// Sequential executor over a [`QueryApi`].
pub struct MetricCollector<'a> {
    api: &'a dyn QueryApi,
}

impl<'a> MetricCollector<'a> {
    pub fn new(api: &'a dyn QueryApi) -> Self {
        Self { api }
    }

    /// Run every query at `at`, in order.
    ///
    /// All-or-nothing: the first failure, non-vector result, or context
    /// cancellation ends the pass and discards what was gathered.
    pub fn collect(
        &self,
        ctx: &EvalContext,
        queries: &[ComposedQuery],
        at: DateTime<Utc>,
    ) -> Result<Vec<CollectedVector>, CollectError> {
        let mut collected = Vec::with_capacity(queries.len());
        for composed in queries {
            ctx.check()?;
            let started = Instant::now();
            let response = match self.api.query(ctx, &composed.query, at) {
                Ok(response) => response,
                Err(ApiError::Context(e)) => return Err(CollectError::Context(e)),
                Err(source) => {
                    return Err(CollectError::Query {
                        query: composed.query.clone(),
                        source,
                    })
                }
            };

            for warning in &response.warnings {
                warn!(
                    target: "ptop.collect",
                    metric = %composed.metric,
                    kind = %composed.kind,
                    warning = %warning,
                    "Backend warning"
                );
            }

            let samples = match response.value {
                QueryValue::Vector(samples) => samples,
                other => {
                    return Err(CollectError::UnexpectedResultType {
                        query: composed.query.clone(),
                        found: other.type_name(),
                    })
                }
            };

            debug!(
                target: "ptop.collect",
                metric = %composed.metric,
                kind = %composed.kind,
                samples = samples.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Query executed"
            );
            collected.push(CollectedVector {
                query: composed.clone(),
                samples,
                warnings: response.warnings,
            });
        }
        Ok(collected)
    }
}
