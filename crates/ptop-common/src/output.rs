//! Output format specifications.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering of the collated record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable one line per record.
    #[default]
    Table,
    /// Fixed-column comma separated text with a header row.
    Csv,
    /// Versioned JSON envelope.
    Json,
    /// Parameterized SQL insert rendered as a standalone script.
    Sql,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Sql => "sql",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
