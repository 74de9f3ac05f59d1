use crate::compose::TemplateKind;
use chrono::{DateTime, Utc};
use ptop_common::schema::QUERY_TIME_FORMAT;
use ptop_common::Fingerprint;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Consolidated view of one (namespace, pod, metric) series.
///
/// Each value field is set only when a query of the matching
/// [`TemplateKind`] returned a sample for this identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateRecord {
    pub fingerprint: Fingerprint,
    pub metric: String,
    pub namespace: String,
    pub pod: String,
    pub label_app: String,
    pub range: String,
    pub query_time: DateTime<Utc>,
    pub q95: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub inst: Option<f64>,
}

impl AggregateRecord {
    pub fn value(&self, kind: TemplateKind) -> Option<f64> {
        match kind {
            TemplateKind::Quantile95 => self.q95,
            TemplateKind::Average => self.avg,
            TemplateKind::Maximum => self.max,
            TemplateKind::Minimum => self.min,
            TemplateKind::Instant => self.inst,
        }
    }

    pub fn set_value(&mut self, kind: TemplateKind, value: f64) {
        let slot = match kind {
            TemplateKind::Quantile95 => &mut self.q95,
            TemplateKind::Average => &mut self.avg,
            TemplateKind::Maximum => &mut self.max,
            TemplateKind::Minimum => &mut self.min,
            TemplateKind::Instant => &mut self.inst,
        };
        *slot = Some(value);
    }

    /// Kinds whose field is populated.
    pub fn populated(&self) -> Vec<TemplateKind> {
        TemplateKind::ALL
            .into_iter()
            .filter(|kind| self.value(*kind).is_some())
            .collect()
    }

    /// Evaluation timestamp in the text form shared by the table and SQL sinks.
    pub fn query_time_text(&self) -> String {
        self.query_time.format(QUERY_TIME_FORMAT).to_string()
    }
}

/// Fingerprint-keyed record table for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    records: BTreeMap<Fingerprint, AggregateRecord>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Existing record for `fingerprint`, or a fresh one built by `create`.
    pub fn entry_or_insert_with(
        &mut self,
        fingerprint: Fingerprint,
        create: impl FnOnce(Fingerprint) -> AggregateRecord,
    ) -> &mut AggregateRecord {
        self.records
            .entry(fingerprint)
            .or_insert_with_key(|fp| create(fp.clone()))
    }

    /// Records in fingerprint order.
    pub fn into_records(self) -> Vec<AggregateRecord> {
        self.records.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn blank() -> AggregateRecord {
        AggregateRecord {
            fingerprint: Fingerprint("00".to_string()),
            metric: "cpu".to_string(),
            namespace: "ns".to_string(),
            pod: "p".to_string(),
            label_app: String::new(),
            range: "10m".to_string(),
            query_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
            q95: None,
            avg: None,
            max: None,
            min: None,
            inst: None,
        }
    }

    #[test]
    fn each_kind_has_its_own_field() {
        for kind in TemplateKind::ALL {
            let mut record = blank();
            record.set_value(kind, 7.0);
            assert_eq!(record.populated(), vec![kind]);
            assert_eq!(record.value(kind), Some(7.0));
        }
    }

    #[test]
    fn instant_never_lands_in_min() {
        let mut record = blank();
        record.set_value(TemplateKind::Instant, 3.0);
        assert_eq!(record.inst, Some(3.0));
        assert_eq!(record.min, None);
    }

    #[test]
    fn query_time_text_format() {
        assert_eq!(blank().query_time_text(), "2024-03-01 12:30:05.000+00");
    }

    #[test]
    fn table_creates_once_per_fingerprint() {
        let mut table = RecordTable::new();
        let mut created = 0;
        for _ in 0..3 {
            table.entry_or_insert_with(Fingerprint("ab".to_string()), |fp| {
                created += 1;
                AggregateRecord {
                    fingerprint: fp,
                    ..blank()
                }
            });
        }
        assert_eq!(created, 1);
        assert_eq!(table.len(), 1);
    }
}
