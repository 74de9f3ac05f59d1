//! Prometheus HTTP API response envelope.
//!
//! ```text
//! {"status":"success","data":{"resultType":"vector","result":[
//!     {"metric":{"pod":"web-1"},"value":[1700000000.123,"0.25"]}]},
//!  "warnings":["..."]}
//! {"status":"error","errorType":"bad_data","error":"..."}
//! ```

use super::api::{ApiError, Labels, QueryResponse, QueryValue, RangeSeries, Sample};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(rename = "errorType", default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct VectorSeries {
    #[serde(default)]
    metric: Labels,
    value: (f64, String),
}

#[derive(Debug, Deserialize)]
struct MatrixSeries {
    #[serde(default)]
    metric: Labels,
    values: Vec<(f64, String)>,
}

/// Decode a `/api/v1/query` response body.
pub fn decode_query_response(body: &str) -> Result<QueryResponse, ApiError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    if envelope.status != "success" {
        return Err(ApiError::Backend {
            error_type: envelope.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: envelope.error.unwrap_or_else(|| envelope.status.clone()),
        });
    }

    let data = envelope
        .data
        .ok_or_else(|| ApiError::Decode("success response without data".to_string()))?;
    let value = decode_value(&data.result_type, data.result)?;

    Ok(QueryResponse {
        value,
        warnings: envelope.warnings,
    })
}

/// Decode an error envelope from a non-2xx body, if it is one.
pub fn decode_error_body(body: &str) -> Option<ApiError> {
    let envelope: Envelope = serde_json::from_str(body).ok()?;
    if envelope.status == "error" {
        Some(ApiError::Backend {
            error_type: envelope.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: envelope.error.unwrap_or_default(),
        })
    } else {
        None
    }
}

fn decode_value(result_type: &str, result: serde_json::Value) -> Result<QueryValue, ApiError> {
    let decode_err = |e: serde_json::Error| ApiError::Decode(format!("{result_type}: {e}"));
    match result_type {
        "vector" => {
            let series: Vec<VectorSeries> = serde_json::from_value(result).map_err(decode_err)?;
            let samples = series
                .into_iter()
                .map(|s| -> Result<Sample, ApiError> {
                    Ok(Sample {
                        labels: s.metric,
                        value: parse_sample_value(&s.value.1)?,
                        timestamp_ms: seconds_to_millis(s.value.0),
                    })
                })
                .collect::<Result<Vec<_>, ApiError>>()?;
            Ok(QueryValue::Vector(samples))
        }
        "matrix" => {
            let series: Vec<MatrixSeries> = serde_json::from_value(result).map_err(decode_err)?;
            let series = series
                .into_iter()
                .map(|s| -> Result<RangeSeries, ApiError> {
                    let values = s
                        .values
                        .iter()
                        .map(|(ts, v)| -> Result<(i64, f64), ApiError> {
                            Ok((seconds_to_millis(*ts), parse_sample_value(v)?))
                        })
                        .collect::<Result<Vec<_>, ApiError>>()?;
                    Ok(RangeSeries {
                        labels: s.metric,
                        values,
                    })
                })
                .collect::<Result<Vec<_>, ApiError>>()?;
            Ok(QueryValue::Matrix(series))
        }
        "scalar" => {
            let (ts, v): (f64, String) = serde_json::from_value(result).map_err(decode_err)?;
            Ok(QueryValue::Scalar {
                timestamp_ms: seconds_to_millis(ts),
                value: parse_sample_value(&v)?,
            })
        }
        "string" => {
            let (ts, v): (f64, String) = serde_json::from_value(result).map_err(decode_err)?;
            Ok(QueryValue::String {
                timestamp_ms: seconds_to_millis(ts),
                value: v,
            })
        }
        other => Err(ApiError::Decode(format!("unknown resultType {other:?}"))),
    }
}

/// Parse a sample value string, including Prometheus' special values.
pub fn parse_sample_value(raw: &str) -> Result<f64, ApiError> {
    match raw {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        _ => raw
            .parse::<f64>()
            .map_err(|_| ApiError::Decode(format!("invalid sample value {raw:?}"))),
    }
}

fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}
