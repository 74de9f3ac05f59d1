//! Template registry: which aggregation templates a run executes.
//!
//! The registry owns the template text for each [`TemplateKind`] plus the
//! label-join wrapper. The built-in set can be replaced piecewise so tests
//! and configs can substitute their own fixtures.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub const QUANTILE_OVER_TIME_TEMPLATE: &str = "quantile_over_time(0.95, {{metric}}[{{range}}])";
pub const AVG_OVER_TIME_TEMPLATE: &str = "avg_over_time({{metric}}[{{range}}])";
pub const MAX_OVER_TIME_TEMPLATE: &str = "max_over_time({{metric}}[{{range}}])";
pub const MIN_OVER_TIME_TEMPLATE: &str = "min_over_time({{metric}}[{{range}}])";
pub const INSTANT_TEMPLATE: &str = "{{metric}}";

/// Wraps a rendered query so every series carries the deployment label.
///
/// `kube_pod_labels` supplies `label_app` per pod; the join attaches it to
/// the inner result and regroups by (pod, namespace, node).
pub const LABEL_JOIN_TEMPLATE: &str = concat!(
    r#"sum by (pod, label_app) (kube_pod_labels{pod!="", label_app!=""})"#,
    " * on (pod) group_right(label_app) ",
    "sum by (pod, namespace, node) ({{query}})",
);

/// One of the fixed aggregation operations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Quantile95,
    Average,
    Maximum,
    Minimum,
    Instant,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 5] = [
        TemplateKind::Quantile95,
        TemplateKind::Average,
        TemplateKind::Maximum,
        TemplateKind::Minimum,
        TemplateKind::Instant,
    ];

    /// Windowed kinds, run when no specific selector is given.
    pub const WINDOWED: [TemplateKind; 4] = [
        TemplateKind::Quantile95,
        TemplateKind::Average,
        TemplateKind::Maximum,
        TemplateKind::Minimum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKind::Quantile95 => "quantile-95",
            TemplateKind::Average => "avg",
            TemplateKind::Maximum => "max",
            TemplateKind::Minimum => "min",
            TemplateKind::Instant => "inst",
        }
    }

    /// Built-in template text for this kind.
    pub fn builtin_template(self) -> &'static str {
        match self {
            TemplateKind::Quantile95 => QUANTILE_OVER_TIME_TEMPLATE,
            TemplateKind::Average => AVG_OVER_TIME_TEMPLATE,
            TemplateKind::Maximum => MAX_OVER_TIME_TEMPLATE,
            TemplateKind::Minimum => MIN_OVER_TIME_TEMPLATE,
            TemplateKind::Instant => INSTANT_TEMPLATE,
        }
    }

    /// Whether the template evaluates over the configured range.
    pub fn is_windowed(self) -> bool {
        !matches!(self, TemplateKind::Instant)
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query-type selector.
///
/// Parsing never fails: anything unrecognized selects the default set, so a
/// typo cannot abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Quantile,
    Average,
    Instant,
    /// Quantile-95, average, maximum and minimum.
    #[default]
    Aggregates,
}

impl QueryType {
    /// Exact, case-sensitive match on the full name or its one-letter form.
    pub fn from_selector(selector: &str) -> Self {
        match selector {
            "quantile" | "q" => QueryType::Quantile,
            "average" | "a" => QueryType::Average,
            "instant" | "i" => QueryType::Instant,
            _ => QueryType::Aggregates,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::Quantile => "quantile",
            QueryType::Average => "average",
            QueryType::Instant => "instant",
            QueryType::Aggregates => "aggregates",
        }
    }
}

impl FromStr for QueryType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(QueryType::from_selector(s))
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of template kinds for a selector.
pub fn select_templates(query_type: QueryType) -> Vec<TemplateKind> {
    match query_type {
        QueryType::Quantile => vec![TemplateKind::Quantile95],
        QueryType::Average => vec![TemplateKind::Average],
        QueryType::Instant => vec![TemplateKind::Instant],
        QueryType::Aggregates => TemplateKind::WINDOWED.to_vec(),
    }
}

/// Template text per kind plus the label-join wrapper.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<TemplateKind, String>,
    label_join: String,
}

impl TemplateRegistry {
    /// Registry with the built-in PromQL templates.
    pub fn builtin() -> Self {
        let templates = TemplateKind::ALL
            .iter()
            .map(|kind| (*kind, kind.builtin_template().to_string()))
            .collect();
        Self {
            templates,
            label_join: LABEL_JOIN_TEMPLATE.to_string(),
        }
    }

    /// Replace the template of one kind.
    pub fn with_template(mut self, kind: TemplateKind, template: impl Into<String>) -> Self {
        self.templates.insert(kind, template.into());
        self
    }

    /// Replace the label-join wrapper.
    pub fn with_label_join(mut self, template: impl Into<String>) -> Self {
        self.label_join = template.into();
        self
    }

    pub fn template(&self, kind: TemplateKind) -> &str {
        self.templates
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.builtin_template())
    }

    pub fn label_join(&self) -> &str {
        &self.label_join
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
