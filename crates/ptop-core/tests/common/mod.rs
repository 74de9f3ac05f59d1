//! Shared fixtures for ptop-core integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use ptop_core::prom::{ApiError, EvalContext, Labels, QueryApi, QueryResponse, QueryValue, Sample};
use std::cell::RefCell;

/// In-memory query interface.
///
/// Each rule pairs a needle with a canned result; the first rule whose
/// needle occurs in the query string answers it. Unmatched queries return
/// an empty vector.
#[derive(Default)]
pub struct FakeApi {
    rules: Vec<(String, Result<QueryValue, String>)>,
    pub calls: RefCell<Vec<(String, DateTime<Utc>)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, needle: &str, value: QueryValue) -> Self {
        self.rules.push((needle.to_string(), Ok(value)));
        self
    }

    pub fn fail(mut self, needle: &str, message: &str) -> Self {
        self.rules.push((needle.to_string(), Err(message.to_string())));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl QueryApi for FakeApi {
    fn query(
        &self,
        ctx: &EvalContext,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryResponse, ApiError> {
        ctx.check()?;
        self.calls.borrow_mut().push((query.to_string(), at));
        for (needle, result) in &self.rules {
            if query.contains(needle.as_str()) {
                return match result {
                    Ok(value) => Ok(QueryResponse::new(value.clone())),
                    Err(message) => Err(ApiError::Backend {
                        error_type: "bad_data".to_string(),
                        message: message.clone(),
                    }),
                };
            }
        }
        Ok(QueryResponse::new(QueryValue::Vector(Vec::new())))
    }
}

/// Sample carrying the labels the label join guarantees.
pub fn pod_sample(namespace: &str, pod: &str, app: &str, value: f64) -> Sample {
    let mut labels = Labels::new();
    labels.insert("namespace".to_string(), namespace.to_string());
    labels.insert("pod".to_string(), pod.to_string());
    labels.insert("label_app".to_string(), app.to_string());
    labels.insert("node".to_string(), "node-a".to_string());
    Sample {
        labels,
        value,
        timestamp_ms: 1_700_000_000_000,
    }
}

pub fn vector(samples: Vec<Sample>) -> QueryValue {
    QueryValue::Vector(samples)
}
