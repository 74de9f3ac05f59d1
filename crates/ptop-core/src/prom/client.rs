//! Blocking Prometheus HTTP API client.

use super::api::{ApiError, QueryApi, QueryResponse};
use super::context::{ContextError, EvalContext};
use super::wire::{decode_error_body, decode_query_response};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Per-request ceiling when the context carries no deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY: usize = 512;

/// Client for `GET /api/v1/query`.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    base_url: String,
    agent: ureq::Agent,
    bearer_token: Option<String>,
    request_timeout: Duration,
}

impl PrometheusClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .user_agent(concat!("prom-top/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
            bearer_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/api/v1/query", self.base_url)
    }
}

/// Evaluation time as Prometheus expects it: unix seconds, millisecond precision.
pub fn format_eval_time(at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis();
    format!("{}.{:03}", millis.div_euclid(1000), millis.rem_euclid(1000))
}

impl QueryApi for PrometheusClient {
    fn query(
        &self,
        ctx: &EvalContext,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryResponse, ApiError> {
        ctx.check()?;
        let timeout = ctx
            .remaining()
            .map(|left| left.min(self.request_timeout))
            .unwrap_or(self.request_timeout);
        if timeout.is_zero() {
            return Err(ContextError::DeadlineExceeded.into());
        }

        let mut request = self
            .agent
            .get(&self.endpoint())
            .timeout(timeout)
            .query("query", query)
            .query("time", &format_eval_time(at));
        if ctx.deadline().is_some() {
            request = request.query("timeout", &format!("{}ms", timeout.as_millis()));
        }
        if let Some(token) = &self.bearer_token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        trace!(target: "ptop.client", url = %self.endpoint(), query, "Sending query");
        let started = Instant::now();
        let result = request.call();
        // A cancel that lands while the request is in flight still fails the query.
        ctx.check()?;

        let body = match result {
            Ok(response) => response
                .into_string()
                .map_err(|e| ApiError::Transport(format!("reading body: {e}")))?,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(decode_error_body(&body).unwrap_or_else(|| ApiError::Status {
                    status,
                    body: truncate(&body, MAX_ERROR_BODY),
                }));
            }
            Err(ureq::Error::Transport(transport)) => {
                if ctx.remaining().is_some_and(|left| left.is_zero()) {
                    return Err(ContextError::DeadlineExceeded.into());
                }
                return Err(ApiError::Transport(transport.to_string()));
            }
        };

        debug!(
            target: "ptop.client",
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = body.len(),
            "Query response received"
        );
        decode_query_response(&body)
    }
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn eval_time_has_millisecond_precision() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(format_eval_time(at), "1700000000.123");
        let at = Utc.timestamp_millis_opt(1_700_000_000_005).unwrap();
        assert_eq!(format_eval_time(at), "1700000000.005");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = PrometheusClient::new("http://prom:9090/");
        assert_eq!(client.base_url(), "http://prom:9090");
        assert_eq!(client.endpoint(), "http://prom:9090/api/v1/query");
    }

    #[test]
    fn cancelled_context_fails_before_request() {
        let client = PrometheusClient::new("http://127.0.0.1:1");
        let ctx = EvalContext::background();
        ctx.cancel_handle().cancel();
        let err = client.query(&ctx, "up", Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::Context(ContextError::Cancelled)));
    }

    #[test]
    fn unreachable_backend_is_transport_error() {
        let client = PrometheusClient::new("http://127.0.0.1:1")
            .with_request_timeout(Duration::from_secs(2));
        let err = client
            .query(&EvalContext::background(), "up", Utc::now())
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "ééééé";
        let t = truncate(s, 3);
        assert!(t.starts_with('é'));
        assert!(t.ends_with('…'));
    }
}
