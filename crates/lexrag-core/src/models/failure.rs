//! Failure aggregation: per-file errors and provider degradation events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recovered provider failure (e.g. an embedding call that fell back to
/// zero vectors). Accumulated for observability, never fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationEvent {
    /// Subsystem that degraded, e.g. "embeddings".
    pub component: String,
    /// What failed.
    pub reason: String,
    /// What the pipeline did instead.
    pub fallback: String,
    pub timestamp: DateTime<Utc>,
}

impl DegradationEvent {
    pub fn new(component: &str, reason: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            component: component.to_string(),
            reason: reason.into(),
            fallback: fallback.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Aggregate of everything that went wrong during one ingestion run.
///
/// Per-file failures are isolated: a failed file is recorded here and the
/// run continues with the remaining files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureReport {
    /// file name → human-readable failure description.
    pub failed_files: BTreeMap<String, String>,
    /// Recovered provider failures.
    pub degradations: Vec<DegradationEvent>,
}

impl FailureReport {
    pub fn record_file(&mut self, file: impl Into<String>, reason: impl Into<String>) {
        self.failed_files.insert(file.into(), reason.into());
    }

    pub fn is_clean(&self) -> bool {
        self.failed_files.is_empty() && self.degradations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_starts_clean() {
        assert!(FailureReport::default().is_clean());
    }

    #[test]
    fn recorded_failure_dirties_report() {
        let mut r = FailureReport::default();
        r.record_file("a.txt", "unreadable");
        assert!(!r.is_clean());
        assert_eq!(r.failed_files["a.txt"], "unreadable");
    }
}
