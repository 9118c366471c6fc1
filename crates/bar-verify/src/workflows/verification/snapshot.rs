use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::directory::{
    Directory, DirectoryQueryFailure, DirectorySession, SearchQuery, SessionFatalError,
};
use super::domain::{CandidateRef, CoarsePeriod, Jurisdiction, ProfileDetails};
use super::matcher::DirectoryPolicy;

/// Offline copy of directory listings keyed by jurisdiction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub georgia: Vec<SnapshotEntry>,
    #[serde(default)]
    pub california: Vec<SnapshotEntry>,
}

impl DirectorySnapshot {
    pub fn entries(&self, jurisdiction: Jurisdiction) -> &[SnapshotEntry] {
        match jurisdiction {
            Jurisdiction::Georgia => &self.georgia,
            Jurisdiction::California => &self.california,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub url: String,
    pub first_name: String,
    pub last_name: String,
    /// Search-results admission period such as `January 2010`.
    #[serde(default)]
    pub listed_period: Option<String>,
    pub profile: ProfileDetails,
}

#[derive(Debug, Clone)]
enum SnapshotSource {
    File(PathBuf),
    Loaded(Arc<DirectorySnapshot>),
}

/// Directory adapter answering searches from a [`DirectorySnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotDirectory {
    source: SnapshotSource,
}

impl SnapshotDirectory {
    /// The file is read each time a session opens.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: SnapshotSource::File(path.into()),
        }
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            source: SnapshotSource::Loaded(Arc::new(snapshot)),
        }
    }

    async fn load(&self, jurisdiction: Jurisdiction) -> Result<Arc<DirectorySnapshot>, SessionFatalError> {
        match &self.source {
            SnapshotSource::Loaded(snapshot) => Ok(snapshot.clone()),
            SnapshotSource::File(path) => {
                let fatal = |reason: String| SessionFatalError {
                    jurisdiction,
                    reason,
                };
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|err| fatal(format!("cannot read {}: {err}", path.display())))?;
                let snapshot = serde_json::from_str::<DirectorySnapshot>(&raw)
                    .map_err(|err| fatal(format!("invalid snapshot {}: {err}", path.display())))?;
                Ok(Arc::new(snapshot))
            }
        }
    }
}

#[async_trait]
impl Directory for SnapshotDirectory {
    async fn open_session(
        &self,
        jurisdiction: Jurisdiction,
    ) -> Result<Box<dyn DirectorySession>, SessionFatalError> {
        let snapshot = self.load(jurisdiction).await?;
        debug!(%jurisdiction, entries = snapshot.entries(jurisdiction).len(), "snapshot session opened");
        Ok(Box::new(SnapshotSession {
            jurisdiction,
            reports_periods: DirectoryPolicy::for_jurisdiction(jurisdiction).coarse_filter,
            snapshot: Some(snapshot),
        }))
    }
}

struct SnapshotSession {
    jurisdiction: Jurisdiction,
    reports_periods: bool,
    snapshot: Option<Arc<DirectorySnapshot>>,
}

impl SnapshotSession {
    fn entries(&self) -> Result<&[SnapshotEntry], DirectoryQueryFailure> {
        self.snapshot
            .as_deref()
            .map(|snapshot| snapshot.entries(self.jurisdiction))
            .ok_or_else(|| DirectoryQueryFailure::Unavailable("session closed".to_string()))
    }
}

#[async_trait]
impl DirectorySession for SnapshotSession {
    async fn search(
        &mut self,
        query: SearchQuery<'_>,
    ) -> Result<Vec<CandidateRef>, DirectoryQueryFailure> {
        let reports_periods = self.reports_periods;
        let hits = self
            .entries()?
            .iter()
            .filter(|entry| {
                entry.first_name.eq_ignore_ascii_case(query.first_name.trim())
                    && entry.last_name.eq_ignore_ascii_case(query.last_name.trim())
            })
            .map(|entry| CandidateRef {
                url: entry.url.clone(),
                coarse_period: if reports_periods {
                    entry.listed_period.as_deref().and_then(CoarsePeriod::parse)
                } else {
                    None
                },
            })
            .collect();
        Ok(hits)
    }

    async fn fetch_profile(
        &mut self,
        candidate: &CandidateRef,
    ) -> Result<ProfileDetails, DirectoryQueryFailure> {
        self.entries()?
            .iter()
            .find(|entry| entry.url == candidate.url)
            .map(|entry| entry.profile.clone())
            .ok_or_else(|| {
                DirectoryQueryFailure::MissingElement(format!("profile details at {}", candidate.url))
            })
    }

    async fn close(&mut self) {
        self.snapshot = None;
    }
}
