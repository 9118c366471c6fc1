use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::model::{Job, JobId, JobState, JobView};
use super::store::{JobStore, JobStoreError};
use crate::workflows::verification::directory::{Directory, DirectorySession, SessionGuard};
use crate::workflows::verification::domain::{InputRecord, Jurisdiction};
use crate::workflows::verification::events::{EventSink, JobEvent};
use crate::workflows::verification::normalizer::{ApiCredential, NameCleaner, NameNormalizer};
use crate::workflows::verification::orchestrator::VerificationOrchestrator;

/// Everything needed to start one job.
#[derive(Debug, Clone)]
pub struct JobSubmission {
    pub jurisdiction: Jurisdiction,
    pub records: Vec<InputRecord>,
    pub credential: ApiCredential,
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] JobStoreError),
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job {0} not found")]
    UnknownId(String),
    #[error("job task failed: {0}")]
    Task(String),
}

/// Returned by [`JobRunner::submit`]; the job keeps running if dropped.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Resolves once the job is terminal and fully published.
    pub async fn wait(self) -> Result<(), JobError> {
        self.task
            .await
            .map_err(|err| JobError::Task(err.to_string()))
    }
}

/// Runs verification jobs one sequential worker per job.
pub struct JobRunner<S> {
    store: Arc<S>,
    directory: Arc<dyn Directory>,
    cleaner: Arc<dyn NameCleaner>,
    ai_budget: Duration,
    active: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
}

impl<S> Clone for JobRunner<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            directory: self.directory.clone(),
            cleaner: self.cleaner.clone(),
            ai_budget: self.ai_budget,
            active: self.active.clone(),
        }
    }
}

impl<S> JobRunner<S>
where
    S: JobStore + 'static,
{
    pub fn new(
        store: Arc<S>,
        directory: Arc<dyn Directory>,
        cleaner: Arc<dyn NameCleaner>,
        ai_budget: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            cleaner,
            ai_budget,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Persist a queued job and start it in the background.
    pub fn submit(&self, submission: JobSubmission) -> Result<JobHandle, JobError> {
        let id = JobId::new();
        self.store.insert(Job::queued(id, submission.jurisdiction))?;

        let cancel = CancellationToken::new();
        self.active
            .lock()
            .expect("active jobs mutex poisoned")
            .insert(id, cancel.clone());

        info!(job_id = %id, jurisdiction = %submission.jurisdiction, records = submission.records.len(), "verification job queued");

        let worker = JobWorker {
            id,
            store: self.store.clone(),
            directory: self.directory.clone(),
            normalizer: NameNormalizer::new(
                self.cleaner.clone(),
                submission.credential,
                self.ai_budget,
            ),
            active: self.active.clone(),
        };
        let task = tokio::spawn(worker.run(submission.jurisdiction, submission.records, cancel));

        Ok(JobHandle { id, task })
    }

    pub fn poll(&self, id: &JobId) -> Result<JobView, JobError> {
        self.store
            .fetch(id)?
            .map(|job| job.view())
            .ok_or(JobError::NotFound(*id))
    }

    /// Request a cooperative stop. `Ok(false)` when the job already ended.
    pub fn cancel(&self, id: &JobId) -> Result<bool, JobError> {
        let token = self
            .active
            .lock()
            .expect("active jobs mutex poisoned")
            .get(id)
            .cloned();

        if let Some(token) = token {
            info!(job_id = %id, "stop requested");
            token.cancel();
            return Ok(true);
        }

        match self.store.fetch(id)? {
            Some(_) => Ok(false),
            None => Err(JobError::NotFound(*id)),
        }
    }
}

enum Execution {
    Completed { stopped: bool },
    Fatal(String),
}

struct JobWorker<S> {
    id: JobId,
    store: Arc<S>,
    directory: Arc<dyn Directory>,
    normalizer: NameNormalizer,
    active: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
}

impl<S> JobWorker<S>
where
    S: JobStore + 'static,
{
    async fn run(self, jurisdiction: Jurisdiction, records: Vec<InputRecord>, cancel: CancellationToken) {
        let id = self.id;
        let (sink, rx) = EventSink::channel(Some(id));
        let publisher = tokio::spawn(publish_events(id, self.store.clone(), rx));

        if let Err(err) = self.store.set_state(&id, JobState::Running, None) {
            warn!(job_id = %id, error = %err, "could not mark job running");
        }

        let execution = tokio::spawn(execute(
            jurisdiction,
            records,
            self.directory.clone(),
            self.normalizer,
            sink.clone(),
            cancel,
        ));
        let execution = match execution.await {
            Ok(execution) => execution,
            Err(err) => Execution::Fatal(format!("verification task aborted: {err}")),
        };

        let (state, error) = match execution {
            Execution::Completed { stopped } => {
                info!(job_id = %id, stopped, "verification job finished");
                (JobState::Finished, None)
            }
            Execution::Fatal(message) => {
                sink.log(format!("!!! MODULE ERROR: {message} !!!"));
                warn!(job_id = %id, error = %message, "verification job failed");
                (JobState::Failed, Some(message))
            }
        };

        drop(sink);
        if let Err(err) = publisher.await {
            warn!(job_id = %id, error = %err, "job event publisher aborted");
        }
        if let Err(err) = self.store.set_state(&id, state, error) {
            warn!(job_id = %id, error = %err, "could not record terminal job state");
        }

        self.active
            .lock()
            .expect("active jobs mutex poisoned")
            .remove(&id);
    }
}

/// The directory session is opened once and closed on every exit path.
async fn execute(
    jurisdiction: Jurisdiction,
    records: Vec<InputRecord>,
    directory: Arc<dyn Directory>,
    normalizer: NameNormalizer,
    sink: EventSink,
    cancel: CancellationToken,
) -> Execution {
    sink.log(format!(
        "--- [Module Start] Starting {} Bar Verification ---",
        jurisdiction.label()
    ));

    let mut session = match directory.open_session(jurisdiction).await {
        Ok(session) => SessionGuard::new(session),
        Err(err) => return Execution::Fatal(err.to_string()),
    };

    let outcome = VerificationOrchestrator::new(jurisdiction, &normalizer, &sink, &cancel)
        .run(&mut session, &records)
        .await;
    session.close().await;

    if outcome.stopped {
        sink.log("\n--- [Module Stopped] Verification stopped by user request. ---");
    } else {
        sink.log(format!(
            "\n--- [Module End] {} verification complete. ---",
            jurisdiction.label()
        ));
    }

    let stopped = outcome.stopped;
    sink.results(outcome.results);
    Execution::Completed { stopped }
}

async fn publish_events<S>(id: JobId, store: Arc<S>, mut rx: mpsc::UnboundedReceiver<JobEvent>)
where
    S: JobStore + 'static,
{
    while let Some(event) = rx.recv().await {
        let published = match event {
            JobEvent::Log(line) => store.append_log(&id, line),
            JobEvent::Results(results) => store.set_results(&id, results),
        };
        if let Err(err) = published {
            warn!(job_id = %id, error = %err, "failed to publish job event");
        }
    }
}
