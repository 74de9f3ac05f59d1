//! prom-top common types, IDs, and errors.
//!
//! This crate provides foundational types shared across ptop-core modules:
//! - Series identity and fingerprint types
//! - Run identifiers and output schema versioning
//! - Common error types
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{Error, Result};
pub use id::{Fingerprint, RunId};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
