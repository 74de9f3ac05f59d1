//! End-to-end aggregation passes against an in-memory query interface.
//!
//! Validates:
//! - default selector folds four windowed kinds into one record per series
//! - instant selector fills only the instantaneous field
//! - one evaluation instant is shared by every query
//! - non-vector results and backend errors fail the whole run
//! - cancellation aborts before any record is produced, even mid-run
//! - folding the same input twice gives identical output

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::{pod_sample, vector, FakeApi};
use ptop_common::id::fingerprint;
use ptop_core::prom::{
    ApiError, CancelHandle, ContextError, EvalContext, QueryApi, QueryResponse, QueryValue,
};
use ptop_core::{
    aggregate, CollectError, MetricCollector, QueryComposer, QueryConfig, QueryType, TemplateKind,
    TemplateRegistry, Top, TopError,
};

fn engine() -> Top {
    Top::new(
        TemplateRegistry::builtin(),
        QueryComposer::new(["cpu", "memory"]),
    )
}

/// Answers like the wrapped fake, then cancels the run after its first call.
struct CancelsAfterFirstCall {
    inner: FakeApi,
    handle: CancelHandle,
}

impl QueryApi for CancelsAfterFirstCall {
    fn query(
        &self,
        ctx: &EvalContext,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryResponse, ApiError> {
        let response = self.inner.query(ctx, query, at);
        self.handle.cancel();
        response
    }
}

fn cluster() -> FakeApi {
    FakeApi::new()
        .respond(
            "cpu[",
            vector(vec![
                pod_sample("shop", "web-1", "web", 0.5),
                pod_sample("shop", "web-2", "web", 0.75),
            ]),
        )
        .respond("memory[", vector(vec![pod_sample("shop", "db-0", "db", 2048.0)]))
        .respond("(cpu)", vector(vec![pod_sample("shop", "web-1", "web", 0.1)]))
        .respond("(memory)", vector(vec![pod_sample("shop", "db-0", "db", 1024.0)]))
}

#[test]
fn default_selector_yields_three_windowed_records() {
    let api = cluster();
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let report = engine().run_at(&QueryConfig::new(&api), at).unwrap();

    assert_eq!(api.call_count(), 8);
    assert_eq!(report.records.len(), 3);
    for record in &report.records {
        assert!(record.q95.is_some(), "{record:?}");
        assert!(record.avg.is_some());
        assert!(record.max.is_some());
        assert!(record.min.is_some());
        assert_eq!(record.inst, None);
        assert_eq!(record.range, "10m");
        assert_eq!(record.query_time, at);
    }

    let db = report
        .records
        .iter()
        .find(|r| r.pod == "db-0")
        .expect("memory record");
    assert_eq!(db.metric, "memory");
    assert_eq!(db.label_app, "db");
    assert_eq!(db.avg, Some(2048.0));
    assert_eq!(db.fingerprint, fingerprint("shop", "db-0", "memory"));
}

#[test]
fn instant_selector_fills_only_instantaneous() {
    let api = cluster();
    let cfg = QueryConfig::new(&api).with_query_type(QueryType::from_selector("instant"));
    let report = engine().run(&cfg).unwrap();

    assert_eq!(api.call_count(), 2);
    assert_eq!(report.records.len(), 2);
    for record in &report.records {
        assert!(record.inst.is_some());
        assert_eq!(record.populated(), vec![TemplateKind::Instant]);
    }
    let web = report.records.iter().find(|r| r.pod == "web-1").unwrap();
    assert_eq!(web.inst, Some(0.1));
    assert_eq!(web.min, None);
}

#[test]
fn every_query_shares_one_instant() {
    let api = cluster();
    engine().run(&QueryConfig::new(&api)).unwrap();
    let calls = api.calls.borrow();
    let first = calls[0].1;
    assert!(calls.iter().all(|(_, at)| *at == first));
}

#[test]
fn custom_range_reaches_every_windowed_query() {
    let api = cluster();
    let cfg = QueryConfig::new(&api).with_range("1h");
    let report = engine().run(&cfg).unwrap();
    assert_eq!(report.range, "1h");
    assert!(api.calls.borrow().iter().all(|(q, _)| q.contains("[1h]")));
    assert!(report.records.iter().all(|r| r.range == "1h"));
}

#[test]
fn non_vector_result_fails_the_run() {
    // Rules match in insertion order, so max queries hit the scalar first.
    let api = FakeApi::new()
        .respond(
            "max_over_time",
            QueryValue::Scalar {
                timestamp_ms: 0,
                value: 1.0,
            },
        )
        .respond("cpu[", vector(vec![pod_sample("shop", "web-1", "web", 0.5)]));
    let err = engine().run(&QueryConfig::new(&api)).unwrap_err();
    match err {
        TopError::Collect(CollectError::UnexpectedResultType { query, found }) => {
            assert!(query.contains("max_over_time(cpu[10m])"));
            assert_eq!(found, "scalar");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn backend_error_fails_the_run_with_query_context() {
    let api = FakeApi::new().fail("avg_over_time(memory", "invalid parameter \"query\"");
    let err = engine().run(&QueryConfig::new(&api)).unwrap_err();
    let common: ptop_common::Error = err.into();
    assert_eq!(common.code(), 30);
    assert!(common.to_string().contains("avg_over_time(memory[10m])"));
}

#[test]
fn cancelled_context_aborts_without_records() {
    let api = cluster();
    let ctx = EvalContext::background();
    ctx.cancel_handle().cancel();
    let err = engine()
        .run(&QueryConfig::new(&api).with_context(ctx))
        .unwrap_err();
    assert!(matches!(
        err,
        TopError::Collect(CollectError::Context(ContextError::Cancelled))
    ));
    assert_eq!(api.call_count(), 0);
}

#[test]
fn cancel_between_queries_discards_collected_vectors() {
    let ctx = EvalContext::background();
    let api = CancelsAfterFirstCall {
        inner: cluster(),
        handle: ctx.cancel_handle(),
    };
    let result = engine().run(&QueryConfig::new(&api).with_context(ctx));
    let err = match result {
        Ok(report) => panic!("expected cancellation, got {} records", report.records.len()),
        Err(err) => err,
    };
    assert!(matches!(
        err,
        TopError::Collect(CollectError::Context(ContextError::Cancelled))
    ));
    assert_eq!(api.inner.call_count(), 1);
}

#[test]
fn fold_is_idempotent() {
    let api = cluster();
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let queries = engine().plan(QueryType::Aggregates, "10m").unwrap();
    let vectors = MetricCollector::new(&api)
        .collect(&EvalContext::background(), &queries, at)
        .unwrap();

    let first = aggregate(&vectors, "10m", at);
    let second = aggregate(&vectors, "10m", at);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[test]
fn separate_identities_never_merge() {
    let api = FakeApi::new().respond(
        "avg_over_time(cpu",
        vector(vec![
            pod_sample("a", "web-1", "web", 1.0),
            pod_sample("b", "web-1", "web", 2.0),
            pod_sample("a", "web-2", "web", 3.0),
        ]),
    );
    let cfg = QueryConfig::new(&api).with_query_type(QueryType::Average);
    let report = engine().run(&cfg).unwrap();
    assert_eq!(report.records.len(), 3);
}
