//! Directory query boundary. Live scraping of bar-association sites sits
//! behind these traits; the crate ships a snapshot-backed implementation.

use async_trait::async_trait;
use tracing::warn;

use super::domain::{CandidateRef, Jurisdiction, ProfileDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQuery<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Record-scoped lookup failure. Never aborts the job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryQueryFailure {
    #[error("directory timed out while {0}")]
    Timeout(String),
    #[error("expected page element missing: {0}")]
    MissingElement(String),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// The directory session could not be established; the whole job fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not open {jurisdiction} directory session: {reason}")]
pub struct SessionFatalError {
    pub jurisdiction: Jurisdiction,
    pub reason: String,
}

/// Factory for per-job directory sessions.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn open_session(
        &self,
        jurisdiction: Jurisdiction,
    ) -> Result<Box<dyn DirectorySession>, SessionFatalError>;
}

/// One scoped directory session, reused for every record of a job.
#[async_trait]
pub trait DirectorySession: Send {
    /// Candidates in directory order. Adapters that can list a coarse
    /// admission period attach it to each candidate.
    async fn search(
        &mut self,
        query: SearchQuery<'_>,
    ) -> Result<Vec<CandidateRef>, DirectoryQueryFailure>;

    async fn fetch_profile(
        &mut self,
        candidate: &CandidateRef,
    ) -> Result<ProfileDetails, DirectoryQueryFailure>;

    /// Releases the underlying handle. Called exactly once per session.
    async fn close(&mut self);
}

/// Owns an open session and guarantees it is closed exactly once.
///
/// `close` releases it in place. If the guard is dropped first, for example
/// while a panic unwinds, the session is handed to a background task that
/// closes it on the current runtime.
pub struct SessionGuard {
    session: Option<Box<dyn DirectorySession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn DirectorySession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    fn released() -> DirectoryQueryFailure {
        DirectoryQueryFailure::Unavailable("session already released".to_string())
    }
}

#[async_trait]
impl DirectorySession for SessionGuard {
    async fn search(
        &mut self,
        query: SearchQuery<'_>,
    ) -> Result<Vec<CandidateRef>, DirectoryQueryFailure> {
        match self.session.as_deref_mut() {
            Some(session) => session.search(query).await,
            None => Err(Self::released()),
        }
    }

    async fn fetch_profile(
        &mut self,
        candidate: &CandidateRef,
    ) -> Result<ProfileDetails, DirectoryQueryFailure> {
        match self.session.as_deref_mut() {
            Some(session) => session.fetch_profile(candidate).await,
            None => Err(Self::released()),
        }
    }

    async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { session.close().await });
            }
            Err(_) => warn!("directory session dropped outside a runtime; not closed"),
        }
    }
}
