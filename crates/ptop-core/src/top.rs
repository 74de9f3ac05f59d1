//! One aggregation pass: select → compose → collect → aggregate.

use crate::aggregate::{AggregateRecord, Aggregator};
use crate::collect::{CollectError, MetricCollector};
use crate::compose::{
    select_templates, ComposeError, ComposedQuery, QueryComposer, QueryType, TemplateRegistry,
};
use crate::prom::{ApiError, ContextError, EvalContext, QueryApi};
use chrono::{DateTime, Utc};
use ptop_config::DEFAULT_RANGE;
use thiserror::Error;
use tracing::info;

/// Inputs of a single run. Borrowed for the run's duration only.
pub struct QueryConfig<'a> {
    pub context: EvalContext,
    pub query_type: QueryType,
    /// Lexical duration such as `10m`; `None` means [`DEFAULT_RANGE`].
    pub range: Option<String>,
    pub api: &'a dyn QueryApi,
}

impl<'a> QueryConfig<'a> {
    /// Background context, default selector and default range.
    pub fn new(api: &'a dyn QueryApi) -> Self {
        Self {
            context: EvalContext::background(),
            query_type: QueryType::default(),
            range: None,
            api,
        }
    }

    pub fn with_context(mut self, context: EvalContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn effective_range(&self) -> &str {
        self.range.as_deref().unwrap_or(DEFAULT_RANGE)
    }
}

/// Errors that abort a run. No records survive either kind.
#[derive(Debug, Error)]
pub enum TopError {
    #[error("composition failed: {0}")]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Collect(#[from] CollectError),
}

impl From<TopError> for ptop_common::Error {
    fn from(err: TopError) -> Self {
        use ptop_common::Error;
        match err {
            TopError::Compose(e) => Error::Composition(e.to_string()),
            TopError::Collect(CollectError::Context(ContextError::Cancelled))
            | TopError::Collect(CollectError::Query {
                source: ApiError::Context(ContextError::Cancelled),
                ..
            }) => Error::Cancelled,
            TopError::Collect(CollectError::Context(ContextError::DeadlineExceeded))
            | TopError::Collect(CollectError::Query {
                source: ApiError::Context(ContextError::DeadlineExceeded),
                ..
            }) => Error::DeadlineExceeded,
            TopError::Collect(CollectError::Query { query, source }) => Error::QueryFailed {
                query,
                message: source.to_string(),
            },
            TopError::Collect(CollectError::UnexpectedResultType { query, found }) => {
                Error::UnexpectedResultType {
                    query,
                    found: found.to_string(),
                }
            }
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct TopReport {
    pub evaluated_at: DateTime<Utc>,
    pub range: String,
    pub query_type: QueryType,
    pub queries: Vec<ComposedQuery>,
    pub records: Vec<AggregateRecord>,
    /// Backend warnings, prefixed with the metric and kind that raised them.
    pub warnings: Vec<String>,
}

/// The aggregation engine, holding its static template and metric data.
#[derive(Debug, Clone, Default)]
pub struct Top {
    registry: TemplateRegistry,
    composer: QueryComposer,
}

impl Top {
    pub fn new(registry: TemplateRegistry, composer: QueryComposer) -> Self {
        Self { registry, composer }
    }

    /// Queries a run with this selector and range would execute.
    pub fn plan(&self, query_type: QueryType, range: &str) -> Result<Vec<ComposedQuery>, ComposeError> {
        let kinds = select_templates(query_type);
        self.composer.compose(&self.registry, &kinds, range)
    }

    /// Run at the current instant.
    pub fn run(&self, cfg: &QueryConfig<'_>) -> Result<TopReport, TopError> {
        self.run_at(cfg, Utc::now())
    }

    /// Run with every query evaluated at `at`.
    pub fn run_at(&self, cfg: &QueryConfig<'_>, at: DateTime<Utc>) -> Result<TopReport, TopError> {
        let range = cfg.effective_range();
        let queries = self.plan(cfg.query_type, range)?;
        let vectors = MetricCollector::new(cfg.api).collect(&cfg.context, &queries, at)?;

        let mut aggregator = Aggregator::new(range, at);
        let mut warnings = Vec::new();
        for vector in &vectors {
            aggregator.fold(vector);
            warnings.extend(vector.warnings.iter().map(|w| {
                format!("{} {}: {}", vector.query.metric, vector.query.kind, w)
            }));
        }
        let records = aggregator.finish();

        info!(
            target: "ptop.aggregate",
            query_type = %cfg.query_type,
            range,
            queries = queries.len(),
            records = records.len(),
            evaluated_at = %at.to_rfc3339(),
            "Aggregation pass complete"
        );

        Ok(TopReport {
            evaluated_at: at,
            range: range.to_string(),
            query_type: cfg.query_type,
            queries,
            records,
            warnings,
        })
    }
}

/// Run the built-in engine once with `cfg`.
pub fn top(cfg: &QueryConfig<'_>) -> Result<Vec<AggregateRecord>, TopError> {
    Top::default().run(cfg).map(|report| report.records)
}
