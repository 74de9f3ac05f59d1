//! Query composition: (metric × template kind) → label-joined PromQL.

use super::registry::{TemplateKind, TemplateRegistry};
use super::template::{ComposeError, Template};
use ptop_config::DEFAULT_TARGET_METRICS;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Label carrying the workload namespace.
pub const NAMESPACE_LABEL: &str = "namespace";
/// Label carrying the pod (instance) name.
pub const POD_LABEL: &str = "pod";
/// Deployment-level label attached by the label join.
pub const DEPLOYMENT_LABEL: &str = "label_app";

/// A rendered query tagged with the metric and kind that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComposedQuery {
    pub metric: String,
    pub kind: TemplateKind,
    pub query: String,
}

/// Renders templates for a fixed list of target metrics.
#[derive(Debug, Clone)]
pub struct QueryComposer {
    metrics: Vec<String>,
}

impl QueryComposer {
    pub fn new<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
        }
    }

    /// Produce one [`ComposedQuery`] per (metric, kind) pair, metric-major.
    ///
    /// Any template error aborts composition; nothing partial is returned.
    pub fn compose(
        &self,
        registry: &TemplateRegistry,
        kinds: &[TemplateKind],
        range: &str,
    ) -> Result<Vec<ComposedQuery>, ComposeError> {
        let label_join = Template::parse(registry.label_join())?;
        label_join.require_once("query")?;

        let templates = kinds
            .iter()
            .map(|kind| -> Result<(TemplateKind, Template), ComposeError> {
                let template = Template::parse(registry.template(*kind))?;
                template.require_once("metric")?;
                Ok((*kind, template))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut queries = Vec::with_capacity(self.metrics.len() * templates.len());
        for metric in &self.metrics {
            for (kind, template) in &templates {
                let inner = if kind.is_windowed() {
                    template.render(&[("metric", metric.as_str()), ("range", range)])?
                } else {
                    template.render(&[("metric", metric.as_str())])?
                };
                let query = label_join.render(&[("query", inner.as_str())])?;
                debug!(
                    target: "ptop.compose",
                    metric = %metric,
                    kind = %kind,
                    query = %query,
                    "Composed query"
                );
                queries.push(ComposedQuery {
                    metric: metric.clone(),
                    kind: *kind,
                    query,
                });
            }
        }
        Ok(queries)
    }
}

impl Default for QueryComposer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_METRICS)
    }
}
