use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::model::{Job, JobId, JobState};
use crate::workflows::verification::domain::VerificationResult;

/// Storage abstraction shared between the runner (writer) and pollers.
pub trait JobStore: Send + Sync {
    fn insert(&self, job: Job) -> Result<(), JobStoreError>;
    fn append_log(&self, id: &JobId, line: String) -> Result<(), JobStoreError>;
    fn set_state(
        &self,
        id: &JobId,
        state: JobState,
        error: Option<String>,
    ) -> Result<(), JobStoreError>;
    fn set_results(&self, id: &JobId, results: Vec<VerificationResult>)
        -> Result<(), JobStoreError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, JobStoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobStoreError {
    #[error("job already exists")]
    Conflict,
    #[error("job not found")]
    NotFound,
    #[error("job {0} is already {1}")]
    Terminal(JobId, &'static str),
    #[error("job store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryJobStore {
    jobs: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl InMemoryJobStore {
    fn with_job<T>(
        &self,
        id: &JobId,
        apply: impl FnOnce(&mut Job) -> Result<T, JobStoreError>,
    ) -> Result<T, JobStoreError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        let job = guard.get_mut(id).ok_or(JobStoreError::NotFound)?;
        let value = apply(job)?;
        job.updated_at = Utc::now();
        Ok(value)
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: Job) -> Result<(), JobStoreError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        if guard.contains_key(&job.id) {
            return Err(JobStoreError::Conflict);
        }
        guard.insert(job.id, job);
        Ok(())
    }

    fn append_log(&self, id: &JobId, line: String) -> Result<(), JobStoreError> {
        self.with_job(id, |job| {
            job.logs.push(line);
            Ok(())
        })
    }

    fn set_state(
        &self,
        id: &JobId,
        state: JobState,
        error: Option<String>,
    ) -> Result<(), JobStoreError> {
        self.with_job(id, |job| {
            if job.state.is_terminal() {
                return Err(JobStoreError::Terminal(job.id, job.state.label()));
            }
            job.state = state;
            if error.is_some() {
                job.error = error;
            }
            Ok(())
        })
    }

    fn set_results(
        &self,
        id: &JobId,
        results: Vec<VerificationResult>,
    ) -> Result<(), JobStoreError> {
        self.with_job(id, |job| {
            if job.state.is_terminal() {
                return Err(JobStoreError::Terminal(job.id, job.state.label()));
            }
            job.results = Some(results);
            Ok(())
        })
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, JobStoreError> {
        let guard = self.jobs.lock().expect("job store mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}
