use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflows::verification::domain::{
    Jurisdiction, ResultRow, ResultSummary, VerificationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Finished,
    Failed,
}

impl JobState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

/// Persisted job record. Logs only ever grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub jurisdiction: Jurisdiction,
    pub state: JobState,
    pub logs: Vec<String>,
    pub results: Option<Vec<VerificationResult>>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn queued(id: JobId, jurisdiction: Jurisdiction) -> Self {
        let now = Utc::now();
        Self {
            id,
            jurisdiction,
            state: JobState::Queued,
            logs: Vec::new(),
            results: None,
            error: None,
            updated_at: now,
        }
    }

    pub fn view(&self) -> JobView {
        let results = if self.state.is_terminal() {
            self.results
                .as_ref()
                .map(|results| results.iter().map(VerificationResult::row).collect())
        } else {
            None
        };
        let summary = self
            .results
            .as_deref()
            .filter(|_| self.state.is_terminal())
            .map(ResultSummary::from_results);

        JobView {
            job_id: self.id,
            state: self.state.label(),
            jurisdiction: self.jurisdiction,
            logs: self.logs.clone(),
            results,
            summary,
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Poll response. Results appear only once the job is terminal.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub job_id: JobId,
    pub state: &'static str,
    pub jurisdiction: Jurisdiction,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ResultRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ResultSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::verification::domain::{InputRecord, VerificationStatus};

    #[test]
    fn job_id_round_trips_through_text() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().expect("uuid parses");
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }

    #[test]
    fn view_hides_results_until_terminal() {
        let record = InputRecord::new("Ann", "Lee", "01/01/2000");
        let mut job = Job::queued(JobId::new(), Jurisdiction::Georgia);
        job.state = JobState::Running;
        job.results = Some(vec![VerificationResult::pending(&record, Jurisdiction::Georgia)
            .with_status(VerificationStatus::NotFound)]);
        assert!(job.view().results.is_none());

        job.state = JobState::Finished;
        let view = job.view();
        assert_eq!(view.state, "finished");
        assert_eq!(view.results.expect("results visible")[0].status, "Not Found");
        assert_eq!(view.summary.expect("summary").not_found, 1);
    }
}
