//! Output schema: versioning and the fixed column sets shared by every sink.

/// Current schema version for JSON outputs.
///
/// Follows semver: MAJOR.MINOR.PATCH
/// - MAJOR: Breaking changes (field removals, type changes)
/// - MINOR: Additive changes (new optional fields)
/// - PATCH: Bug fixes, documentation
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Column names of the textual table, in order.
pub const TABLE_COLUMNS: [&str; 10] = [
    "metric",
    "range",
    "pod",
    "namespace",
    "label-app",
    "quantile-95",
    "max",
    "min",
    "avg",
    "inst",
];

/// Column names of the SQL sink, in bind order.
pub const SQL_COLUMNS: [&str; 12] = [
    "version",
    "metric",
    "range",
    "pod",
    "namespace",
    "label_app",
    "query_time",
    "q95_value",
    "avg_value",
    "max_value",
    "min_value",
    "inst_value",
];

/// Text format of the evaluation timestamp (UTC, accepted by `timestamptz`).
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f+00";

/// Render the fixed table header line (without trailing newline).
pub fn table_header() -> String {
    TABLE_COLUMNS.join(", ")
}
