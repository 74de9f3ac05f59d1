//! Metric collection: executes composed queries at one evaluation instant.

mod collector;

pub use collector::{CollectError, CollectedVector, MetricCollector};
