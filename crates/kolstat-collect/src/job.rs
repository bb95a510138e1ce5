//! Collection job lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::ResultRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// One creator to collect, plus everything the run learned about it.
/// `Completed` and `Failed` are terminal within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionJob {
    pub identity_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub record: ResultRecord,
    /// Human-readable notes about optional fetches that failed while the job
    /// still completed.
    #[serde(default)]
    pub failure_notes: Vec<String>,
    /// Why the job failed outright, when it did.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl CollectionJob {
    #[must_use]
    pub fn new(identity_id: impl Into<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            status: JobStatus::Pending,
            record: ResultRecord::new(),
            failure_notes: Vec::new(),
            error: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }
}
