//! Asynchronous, pollable, cancellable verification jobs.

pub mod model;
pub mod router;
pub mod runner;
pub mod store;

pub use model::{Job, JobId, JobState, JobView};
pub use router::verification_router;
pub use runner::{JobError, JobHandle, JobRunner, JobSubmission};
pub use store::{InMemoryJobStore, JobStore, JobStoreError};
