//! Versioned JSON output envelope.

use crate::aggregate::AggregateRecord;
use crate::compose::{ComposedQuery, QueryType};
use crate::top::TopReport;
use chrono::{DateTime, Utc};
use ptop_common::{RunId, SCHEMA_VERSION};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Machine-readable result of one run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunEnvelope {
    pub schema_version: String,
    pub run_id: RunId,
    pub evaluated_at: DateTime<Utc>,
    pub range: String,
    pub query_type: QueryType,
    pub queries: Vec<ComposedQuery>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub records: Vec<AggregateRecord>,
}

impl RunEnvelope {
    pub fn from_report(run_id: RunId, report: &TopReport) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            run_id,
            evaluated_at: report.evaluated_at,
            range: report.range.clone(),
            query_type: report.query_type,
            queries: report.queries.clone(),
            warnings: report.warnings.clone(),
            records: report.records.clone(),
        }
    }
}

/// JSON Schema of [`RunEnvelope`], pretty-printed.
pub fn schema_json() -> serde_json::Result<String> {
    let schema = schemars::schema_for!(RunEnvelope);
    serde_json::to_string_pretty(&schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_names_envelope_fields() {
        let schema = schema_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&schema).unwrap();
        let props = value["properties"].as_object().unwrap();
        for field in ["schema_version", "run_id", "evaluated_at", "records", "queries"] {
            assert!(props.contains_key(field), "missing {field}");
        }
    }

    #[test]
    fn envelope_round_trips_report() {
        let report = TopReport {
            evaluated_at: Utc::now(),
            range: "10m".to_string(),
            query_type: QueryType::Instant,
            queries: Vec::new(),
            records: Vec::new(),
            warnings: vec!["w".to_string()],
        };
        let env = RunEnvelope::from_report(RunId::new(), &report);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["schema_version"], SCHEMA_VERSION);
        assert_eq!(json["query_type"], "instant");
        assert_eq!(json["warnings"][0], "w");
    }
}
