use super::record::{AggregateRecord, RecordTable};
use crate::collect::CollectedVector;
use crate::compose::{TemplateKind, DEPLOYMENT_LABEL, NAMESPACE_LABEL, POD_LABEL};
use crate::prom::Sample;
use chrono::{DateTime, Utc};
use ptop_common::id::fingerprint;
use tracing::{debug, warn};

/// Single-pass fold of collected vectors into a [`RecordTable`].
///
/// The aggregator owns its table exclusively; nothing else writes to it
/// until [`Aggregator::finish`] hands the records out.
#[derive(Debug)]
pub struct Aggregator {
    range: String,
    evaluated_at: DateTime<Utc>,
    table: RecordTable,
    samples_seen: usize,
    missing_labels: usize,
}

impl Aggregator {
    pub fn new(range: impl Into<String>, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            range: range.into(),
            evaluated_at,
            table: RecordTable::new(),
            samples_seen: 0,
            missing_labels: 0,
        }
    }

    /// Fold every sample of one collected vector.
    pub fn fold(&mut self, vector: &CollectedVector) {
        for sample in &vector.samples {
            self.fold_sample(&vector.query.metric, vector.query.kind, sample);
        }
    }

    /// Fold one sample produced by a query of `kind` over `metric`.
    ///
    /// Absent namespace or pod labels read as empty strings.
    pub fn fold_sample(&mut self, metric: &str, kind: TemplateKind, sample: &Sample) {
        self.samples_seen += 1;
        let namespace = sample.label(NAMESPACE_LABEL);
        let pod = sample.label(POD_LABEL);
        if namespace.is_empty() || pod.is_empty() {
            self.missing_labels += 1;
            debug!(
                target: "ptop.aggregate",
                metric,
                kind = %kind,
                labels = ?sample.labels,
                "Sample lacks namespace or pod label"
            );
        }

        let record = self
            .table
            .entry_or_insert_with(fingerprint(namespace, pod, metric), |fp| AggregateRecord {
                fingerprint: fp,
                metric: String::new(),
                namespace: String::new(),
                pod: String::new(),
                label_app: String::new(),
                range: String::new(),
                query_time: self.evaluated_at,
                q95: None,
                avg: None,
                max: None,
                min: None,
                inst: None,
            });
        record.metric = metric.to_string();
        record.namespace = namespace.to_string();
        record.pod = pod.to_string();
        record.label_app = sample.label(DEPLOYMENT_LABEL).to_string();
        record.range.clone_from(&self.range);
        record.query_time = self.evaluated_at;
        record.set_value(kind, sample.value);
    }

    /// Samples that were missing the namespace or pod label.
    pub fn missing_labels(&self) -> usize {
        self.missing_labels
    }

    /// Emit the records, ordered by fingerprint.
    pub fn finish(self) -> Vec<AggregateRecord> {
        if self.missing_labels > 0 {
            warn!(
                target: "ptop.aggregate",
                count = self.missing_labels,
                "Samples without namespace or pod label were kept with empty values"
            );
        }
        debug!(
            target: "ptop.aggregate",
            samples = self.samples_seen,
            records = self.table.len(),
            "Aggregation finished"
        );
        self.table.into_records()
    }
}

/// Fold `vectors` into records for one evaluation instant.
pub fn aggregate(
    vectors: &[CollectedVector],
    range: &str,
    evaluated_at: DateTime<Utc>,
) -> Vec<AggregateRecord> {
    let mut aggregator = Aggregator::new(range, evaluated_at);
    for vector in vectors {
        aggregator.fold(vector);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ComposedQuery;
    use crate::prom::Labels;

    fn sample(labels: &[(&str, &str)], value: f64) -> Sample {
        Sample {
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Labels>(),
            value,
            timestamp_ms: 0,
        }
    }

    fn vector(metric: &str, kind: TemplateKind, samples: Vec<Sample>) -> CollectedVector {
        CollectedVector {
            query: ComposedQuery {
                metric: metric.to_string(),
                kind,
                query: format!("{kind}({metric})"),
            },
            samples,
            warnings: Vec::new(),
        }
    }

    fn web1(value: f64) -> Sample {
        sample(
            &[("namespace", "shop"), ("pod", "web-1"), ("label_app", "web")],
            value,
        )
    }

    #[test]
    fn kinds_fold_into_one_record() {
        let at = Utc::now();
        let records = aggregate(
            &[
                vector("cpu", TemplateKind::Quantile95, vec![web1(0.9)]),
                vector("cpu", TemplateKind::Average, vec![web1(0.4)]),
            ],
            "10m",
            at,
        );
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.q95, Some(0.9));
        assert_eq!(r.avg, Some(0.4));
        assert_eq!(r.max, None);
        assert_eq!(r.inst, None);
        assert_eq!(r.label_app, "web");
        assert_eq!(r.range, "10m");
        assert_eq!(r.query_time, at);
        assert_eq!(r.fingerprint, fingerprint("shop", "web-1", "cpu"));
    }

    #[test]
    fn differing_identity_splits_records() {
        let records = aggregate(
            &[
                vector("cpu", TemplateKind::Average, vec![web1(1.0)]),
                vector("mem", TemplateKind::Average, vec![web1(2.0)]),
                vector(
                    "cpu",
                    TemplateKind::Average,
                    vec![sample(&[("namespace", "other"), ("pod", "web-1")], 3.0)],
                ),
            ],
            "10m",
            Utc::now(),
        );
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn missing_labels_degrade_to_empty() {
        let mut aggregator = Aggregator::new("5m", Utc::now());
        aggregator.fold(&vector(
            "cpu",
            TemplateKind::Instant,
            vec![sample(&[("node", "n1")], 1.5)],
        ));
        assert_eq!(aggregator.missing_labels(), 1);
        let records = aggregator.finish();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].namespace, "");
        assert_eq!(records[0].pod, "");
        assert_eq!(records[0].inst, Some(1.5));
        assert_eq!(records[0].min, None);
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(aggregate(&[], "10m", Utc::now()).is_empty());
    }
}
