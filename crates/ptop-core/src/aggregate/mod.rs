//! Aggregation: folds per-kind vectors into one record per series identity.

mod aggregator;
mod record;

pub use aggregator::{aggregate, Aggregator};
pub use record::{AggregateRecord, RecordTable};
