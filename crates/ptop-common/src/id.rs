//! Series and run identity types.
//!
//! A workload series is uniquely identified by the
//! (namespace, pod, source metric) tuple. Its fingerprint is the table key
//! used to fold samples from different aggregation queries into one record.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Field separator fed to the hasher between identity components.
///
/// Namespace and pod names are Kubernetes DNS names and metric names
/// match `[a-zA-Z_:][a-zA-Z0-9_:]*`, so none of them contains a NUL byte
/// and `("a-b", "c")` and `("a", "b-c")` never collide.
const FIELD_SEPARATOR: &[u8] = &[0];

/// Short hex digest identifying one (namespace, pod, metric) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fingerprint a (namespace, pod, metric) triple.
///
/// Every call builds a fresh hasher, so the result depends only on the
/// three inputs.
pub fn fingerprint(namespace: &str, pod: &str, metric: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(pod.as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(metric.as_bytes());
    let digest = hasher.finalize();
    Fingerprint(hex::encode(&digest[..8]))
}

/// Run ID for correlating logs and exported tables of one invocation.
///
/// Format: `run-<date>-<time>-<random>`
/// Example: `run-20260115-143022-abc123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new run ID.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let random: String = uuid::Uuid::new_v4()
            .to_string()
            .chars()
            .take(6)
            .collect();
        RunId(format!("run-{}-{}", now.format("%Y%m%d-%H%M%S"), random))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
