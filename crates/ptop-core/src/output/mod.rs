//! Renderers for a finished run: text table, CSV, JSON envelope, SQL insert.

pub mod envelope;
pub mod sql;
pub mod table;

pub use envelope::{schema_json, RunEnvelope};
pub use sql::{build_insert, InsertStatement, SqlValue};
pub use table::{format_scientific, render_csv, render_text};
