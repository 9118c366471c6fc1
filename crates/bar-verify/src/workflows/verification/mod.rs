//! Attorney license verification against state bar directories.
//!
//! Input rows are cleaned, searched, and matched one at a time by the
//! [`orchestrator`]; [`jobs`] wraps a run over a whole batch as a pollable,
//! cancellable background job.

pub mod directory;
pub mod domain;
pub mod events;
pub mod gemini;
pub mod ingest;
pub mod jobs;
pub mod matcher;
pub mod normalizer;
pub mod orchestrator;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use directory::{
    Directory, DirectoryQueryFailure, DirectorySession, SearchQuery, SessionFatalError,
    SessionGuard,
};
pub use domain::{
    AdmitDate, CandidateRef, CoarsePeriod, InputRecord, Jurisdiction, NormalizedName,
    ProfileDetails, ResultRow, RESULT_COLUMNS, ResultSummary, UnknownJurisdiction, VerificationResult,
    VerificationStatus,
};
pub use events::{EventSink, JobEvent};
pub use gemini::GeminiCleaner;
pub use ingest::{ColumnMapping, IngestError};
pub use jobs::{
    verification_router, InMemoryJobStore, Job, JobError, JobHandle, JobId, JobRunner, JobState,
    JobStore, JobStoreError, JobSubmission, JobView,
};
pub use matcher::{CandidateMatcher, DateComparison, DirectoryPolicy};
pub use normalizer::{ApiCredential, CleaningFailure, CleaningRequest, NameCleaner, NameNormalizer};
pub use orchestrator::{Cancelled, RunOutcome, VerificationOrchestrator};
pub use snapshot::{DirectorySnapshot, SnapshotDirectory, SnapshotEntry};
