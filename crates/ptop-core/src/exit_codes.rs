//! Exit codes for the prom-top CLI.
//!
//! Exit codes communicate the run outcome without requiring output parsing.

use ptop_common::Error;

/// Exit codes for prom-top operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed and produced records
    Clean = 0,

    /// Run completed but no series matched
    NoRecords = 1,

    /// Configuration error
    ConfigError = 10,

    /// Query execution / collection error
    QueryError = 11,

    /// Template composition error
    ComposeError = 12,

    /// I/O error
    IoError = 13,

    /// Cancelled or past the deadline
    Interrupted = 14,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::NoRecords)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Exit code for a run that finished with `records` records.
    pub fn for_records(records: usize) -> Self {
        if records == 0 {
            ExitCode::NoRecords
        } else {
            ExitCode::Clean
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidConfig(_) => ExitCode::ConfigError,
            Error::Composition(_) => ExitCode::ComposeError,
            Error::QueryFailed { .. } | Error::UnexpectedResultType { .. } => ExitCode::QueryError,
            Error::Cancelled | Error::DeadlineExceeded => ExitCode::Interrupted,
            Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}
