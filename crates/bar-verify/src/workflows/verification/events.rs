use tokio::sync::mpsc;
use tracing::{debug, info};

use super::domain::VerificationResult;
use super::jobs::JobId;

/// Progress and outcome events produced while a job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Log(String),
    Results(Vec<VerificationResult>),
}

/// Sending half of a job's event channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    job_id: Option<JobId>,
    tx: mpsc::UnboundedSender<JobEvent>,
}

impl EventSink {
    pub fn channel(job_id: Option<JobId>) -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { job_id, tx }, rx)
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        match &self.job_id {
            Some(job_id) => info!(%job_id, "{}", message.trim_start()),
            None => info!("{}", message.trim_start()),
        }
        self.send(JobEvent::Log(message));
    }

    pub fn results(&self, results: Vec<VerificationResult>) {
        self.send(JobEvent::Results(results));
    }

    fn send(&self, event: JobEvent) {
        if self.tx.send(event).is_err() {
            debug!(job_id = ?self.job_id, "job event receiver dropped");
        }
    }
}

/// Drains a receiver until every sender has been dropped.
pub async fn collect(mut rx: mpsc::UnboundedReceiver<JobEvent>) -> Vec<JobEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}
