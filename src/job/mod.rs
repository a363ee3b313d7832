pub mod command;
pub mod poller;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

pub use self::poller::{PollOutcome, Poller};

/// Cadence of historical search polls when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Wait budget of historical search polls when none is configured.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);

/// Status of a historical search.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum JobStatus {
    #[serde(alias = "NotStarted")]
    Submitted,
    #[serde(alias = "Running")]
    InProgress,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::InProgress => write!(f, "in progress"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A server-side historical search.
///
/// The status is only ever updated by polling the server again.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalJob {
    pub job_id: String,
    #[serde(default, alias = "reportTitle")]
    pub title: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "fileUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub result_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoricalJob {
    pub fn new(job_id: impl ToString, status: JobStatus) -> Self {
        Self {
            job_id: job_id.to_string(),
            title: String::new(),
            status,
            submitted_at: None,
            result_location: None,
            rows: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl fmt::Display for HistoricalJob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "historical search {} is {}", self.job_id, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_job() {
        let job: HistoricalJob = serde_json::from_str(
            r#"{"jobId": "8d1f", "reportTitle": "team", "status": "NotStarted"}"#,
        )
        .unwrap();
        assert_eq!("8d1f", job.job_id);
        assert_eq!("team", job.title);
        assert_eq!(JobStatus::Submitted, job.status);
        assert!(!job.is_terminal());

        let job: HistoricalJob = serde_json::from_str(
            r#"{"jobId": "8d1f", "status": "Done", "fileUrl": "https://reports.localhost/8d1f.csv", "rows": 12}"#,
        )
        .unwrap();
        assert!(job.is_terminal());
        assert_eq!(
            Some("https://reports.localhost/8d1f.csv"),
            job.result_location.as_deref()
        );
    }
}
