//! prom-top core library.
//!
//! One invocation performs a single aggregation pass against a Prometheus
//! instant-query API:
//!
//! ```text
//! TemplateRegistry ──► QueryComposer ──► MetricCollector ──► Aggregator
//!   (kinds)             (PromQL)          (vectors @ t)       (records)
//! ```
//!
//! Every query in a pass is evaluated at the same instant, and the pass is
//! all-or-nothing: any composition or query failure yields no records.

pub mod aggregate;
pub mod cli;
pub mod collect;
pub mod compose;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod prom;
pub mod top;

pub use aggregate::{aggregate, AggregateRecord, Aggregator, RecordTable};
pub use collect::{CollectError, CollectedVector, MetricCollector};
pub use compose::{ComposeError, ComposedQuery, QueryComposer, QueryType, TemplateKind, TemplateRegistry};
pub use exit_codes::ExitCode;
pub use prom::{ApiError, EvalContext, PrometheusClient, QueryApi};
pub use top::{top, QueryConfig, Top, TopError, TopReport};
