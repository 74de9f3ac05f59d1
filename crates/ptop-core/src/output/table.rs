//! Delimited and human-readable table renderings.

use crate::aggregate::AggregateRecord;
use ptop_common::schema::table_header;
use std::fmt::Write as _;

const DELIMITER: &str = ",";

/// Shortest round-trip scientific notation with a signed, two-digit
/// minimum exponent: `1.5e+00`, `2.5e-07`, `1e+100`.
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let raw = format!("{value:e}");
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

fn cell(value: Option<f64>) -> String {
    value.map(format_scientific).unwrap_or_default()
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One delimited row in header column order; unset values are empty cells.
pub fn csv_row(record: &AggregateRecord) -> String {
    [
        quote(&record.metric),
        quote(&record.range),
        quote(&record.pod),
        quote(&record.namespace),
        quote(&record.label_app),
        cell(record.q95),
        cell(record.max),
        cell(record.min),
        cell(record.avg),
        cell(record.inst),
    ]
    .join(DELIMITER)
}

/// Header line followed by one row per record, in the order given.
pub fn render_csv(records: &[AggregateRecord]) -> String {
    let mut out = table_header();
    out.push('\n');
    for record in records {
        out.push_str(&csv_row(record));
        out.push('\n');
    }
    out
}

/// Aligned table for terminals, sorted by (metric, namespace, pod).
pub fn render_text(records: &[AggregateRecord]) -> String {
    let mut sorted: Vec<&AggregateRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        (&a.metric, &a.namespace, &a.pod).cmp(&(&b.metric, &b.namespace, &b.pod))
    });

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36} {:<16} {:<32} {:<16} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "METRIC", "NAMESPACE", "POD", "APP", "Q95", "AVG", "MAX", "MIN", "INST"
    );
    for r in sorted {
        let _ = writeln!(
            out,
            "{:<36} {:<16} {:<32} {:<16} {:>12} {:>12} {:>12} {:>12} {:>12}",
            r.metric,
            r.namespace,
            r.pod,
            r.label_app,
            short(r.q95),
            short(r.avg),
            short(r.max),
            short(r.min),
            short(r.inst),
        );
    }
    out
}

fn short(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v.is_finite() => format!("{v:.4e}"),
        Some(v) => format_scientific(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ptop_common::Fingerprint;

    fn record(metric: &str, pod: &str) -> AggregateRecord {
        AggregateRecord {
            fingerprint: Fingerprint(format!("{metric}-{pod}")),
            metric: metric.to_string(),
            namespace: "shop".to_string(),
            pod: pod.to_string(),
            label_app: "web".to_string(),
            range: "10m".to_string(),
            query_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            q95: Some(1.5),
            avg: Some(0.25),
            max: None,
            min: Some(0.0),
            inst: None,
        }
    }

    #[test]
    fn scientific_matches_fixed_format() {
        assert_eq!(format_scientific(1.5), "1.5e+00");
        assert_eq!(format_scientific(0.0), "0e+00");
        assert_eq!(format_scientific(123456.0), "1.23456e+05");
        assert_eq!(format_scientific(0.00025), "2.5e-04");
        assert_eq!(format_scientific(1e100), "1e+100");
        assert_eq!(format_scientific(-3.0), "-3e+00");
        assert_eq!(format_scientific(f64::NAN), "NaN");
        assert_eq!(format_scientific(f64::INFINITY), "+Inf");
        assert_eq!(format_scientific(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn csv_has_header_and_column_order() {
        let out = render_csv(&[record("cpu", "web-1")]);
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("metric, range, pod, namespace, label-app, quantile-95, max, min, avg, inst")
        );
        assert_eq!(
            lines.next(),
            Some("cpu,10m,web-1,shop,web,1.5e+00,,0e+00,2.5e-01,")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_quotes_delimiters_in_labels() {
        let mut r = record("cpu", "web-1");
        r.label_app = "a,b".to_string();
        assert!(csv_row(&r).contains("\"a,b\""));
    }

    #[test]
    fn csv_row_cells_have_no_leading_space() {
        let row = csv_row(&record("cpu", "web-1"));
        let cells: Vec<&str> = row.split(',').collect();
        assert_eq!(cells.len(), 10);
        assert!(cells.iter().all(|c| !c.starts_with(' ')), "{row}");
        assert_eq!(cells[2], "web-1");
        assert_eq!(cells[5], "1.5e+00");
    }

    #[test]
    fn text_is_sorted() {
        let out = render_text(&[record("mem", "a"), record("cpu", "b"), record("cpu", "a")]);
        let rows: Vec<&str> = out.lines().skip(1).collect();
        assert!(rows[0].starts_with("cpu") && rows[0].contains(" a "));
        assert!(rows[1].starts_with("cpu") && rows[1].contains(" b "));
        assert!(rows[2].starts_with("mem"));
    }
}
