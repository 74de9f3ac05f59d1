//! Parameterized insert for the tabular storage sink.
//!
//! Connection handling lives outside this crate; callers bind
//! [`InsertStatement::params`] with their driver of choice, or pipe
//! [`InsertStatement::to_script`] into `psql`.

use crate::aggregate::AggregateRecord;
use ptop_common::schema::SQL_COLUMNS;
use serde::Serialize;
use std::fmt::Write as _;

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Text(String),
    Float(f64),
    Null,
}

impl SqlValue {
    fn from_option(value: Option<f64>) -> Self {
        value.map(SqlValue::Float).unwrap_or(SqlValue::Null)
    }

    /// Literal form for a standalone script.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlValue::Float(v) if v.is_nan() => "'NaN'::float8".to_string(),
            SqlValue::Float(v) if v.is_infinite() && *v > 0.0 => "'Infinity'::float8".to_string(),
            SqlValue::Float(v) if v.is_infinite() => "'-Infinity'::float8".to_string(),
            SqlValue::Float(v) => format!("{v:?}"),
            SqlValue::Null => "NULL".to_string(),
        }
    }
}

/// One multi-row insert with positional (`$n`) placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl InsertStatement {
    pub fn row_count(&self) -> usize {
        self.params.len() / SQL_COLUMNS.len()
    }

    /// Inline every parameter as a literal and terminate the statement.
    pub fn to_script(&self) -> String {
        let mut out = String::with_capacity(self.sql.len() + self.params.len() * 8);
        let mut rest = self.sql.as_str();
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];
            let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
            match tail[..digits].parse::<usize>() {
                Ok(n) if (1..=self.params.len()).contains(&n) => {
                    out.push_str(&self.params[n - 1].to_literal());
                }
                _ => {
                    out.push('$');
                    out.push_str(&tail[..digits]);
                }
            }
            rest = &tail[digits..];
        }
        out.push_str(rest);
        out.push_str(";\n");
        out
    }
}

/// Build the insert for `records` into `table`, tagged with `build_version`.
///
/// Returns `None` when there is nothing to insert.
pub fn build_insert(
    table: &str,
    build_version: &str,
    records: &[AggregateRecord],
) -> Option<InsertStatement> {
    if records.is_empty() {
        return None;
    }
    let width = SQL_COLUMNS.len();
    let mut sql = format!("INSERT INTO {table} ({}) VALUES", SQL_COLUMNS.join(", "));
    let mut params = Vec::with_capacity(records.len() * width);

    for (row, record) in records.iter().enumerate() {
        let base = row * width;
        let placeholders: Vec<String> = (1..=width).map(|i| format!("${}", base + i)).collect();
        let sep = if row == 0 { " " } else { ", " };
        let _ = write!(sql, "{sep}({})", placeholders.join(", "));

        params.extend([
            SqlValue::Text(build_version.to_string()),
            SqlValue::Text(record.metric.clone()),
            SqlValue::Text(record.range.clone()),
            SqlValue::Text(record.pod.clone()),
            SqlValue::Text(record.namespace.clone()),
            SqlValue::Text(record.label_app.clone()),
            SqlValue::Text(record.query_time_text()),
            SqlValue::from_option(record.q95),
            SqlValue::from_option(record.avg),
            SqlValue::from_option(record.max),
            SqlValue::from_option(record.min),
            SqlValue::from_option(record.inst),
        ]);
    }

    Some(InsertStatement { sql, params })
}
