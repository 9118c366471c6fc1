use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::workflows::verification::directory::{
    Directory, DirectoryQueryFailure, DirectorySession, SearchQuery, SessionFatalError,
};
use crate::workflows::verification::domain::{
    CandidateRef, Jurisdiction, ProfileDetails,
};
use crate::workflows::verification::events::{collect, EventSink, JobEvent};
use crate::workflows::verification::normalizer::{
    ApiCredential, CleaningFailure, CleaningRequest, NameCleaner, NameNormalizer,
};

/// AI collaborator answering from a raw-name lookup table.
#[derive(Default)]
pub(super) struct TableCleaner {
    answers: HashMap<String, Result<String, CleaningFailure>>,
}

impl TableCleaner {
    pub(super) fn with(mut self, raw: &str, answer: Result<&str, CleaningFailure>) -> Self {
        self.answers
            .insert(raw.to_string(), answer.map(str::to_string));
        self
    }
}

#[async_trait]
impl NameCleaner for TableCleaner {
    async fn clean(
        &self,
        request: CleaningRequest<'_>,
        _credential: &ApiCredential,
    ) -> Result<String, CleaningFailure> {
        self.answers
            .get(request.raw_first_name)
            .cloned()
            .unwrap_or_else(|| Err(CleaningFailure::Transport("no scripted answer".to_string())))
    }
}

pub(super) fn normalizer(cleaner: TableCleaner) -> NameNormalizer {
    NameNormalizer::new(
        Arc::new(cleaner),
        ApiCredential::new("test-key"),
        Duration::from_secs(30),
    )
}

#[derive(Debug, Default)]
pub(super) struct DirectoryCalls {
    pub(super) searches: Vec<(String, String)>,
    pub(super) fetches: Vec<String>,
    pub(super) opened: usize,
    pub(super) closed: usize,
}

/// Scripted directory: search hits keyed by `first last`, profiles by URL.
#[derive(Clone, Default)]
pub(super) struct ScriptedDirectory {
    hits: HashMap<String, Result<Vec<CandidateRef>, DirectoryQueryFailure>>,
    profiles: HashMap<String, Result<ProfileDetails, DirectoryQueryFailure>>,
    fatal: Option<String>,
    /// Cancels the token once this many profiles have been fetched.
    cancel_after_fetches: Option<(usize, CancellationToken)>,
    calls: Arc<Mutex<DirectoryCalls>>,
}

impl ScriptedDirectory {
    pub(super) fn hits(mut self, first: &str, last: &str, candidates: Vec<CandidateRef>) -> Self {
        self.hits
            .insert(format!("{first} {last}"), Ok(candidates));
        self
    }

    pub(super) fn failing_search(mut self, first: &str, last: &str) -> Self {
        self.hits.insert(
            format!("{first} {last}"),
            Err(DirectoryQueryFailure::Timeout("waiting for results table".to_string())),
        );
        self
    }

    pub(super) fn profile(mut self, url: &str, status: &str, discipline: &str, admitted: &str) -> Self {
        self.profiles.insert(
            url.to_string(),
            Ok(ProfileDetails {
                status: status.to_string(),
                discipline: discipline.to_string(),
                admit_date_text: admitted.to_string(),
            }),
        );
        self
    }

    pub(super) fn broken_profile(mut self, url: &str) -> Self {
        self.profiles.insert(
            url.to_string(),
            Err(DirectoryQueryFailure::MissingElement("admit date".to_string())),
        );
        self
    }

    pub(super) fn fatal(mut self, reason: &str) -> Self {
        self.fatal = Some(reason.to_string());
        self
    }

    pub(super) fn cancel_after_fetches(mut self, fetches: usize, token: CancellationToken) -> Self {
        self.cancel_after_fetches = Some((fetches, token));
        self
    }

    pub(super) fn calls(&self) -> std::sync::MutexGuard<'_, DirectoryCalls> {
        self.calls.lock().expect("calls mutex poisoned")
    }
}

#[async_trait]
impl Directory for ScriptedDirectory {
    async fn open_session(
        &self,
        jurisdiction: Jurisdiction,
    ) -> Result<Box<dyn DirectorySession>, SessionFatalError> {
        if let Some(reason) = &self.fatal {
            return Err(SessionFatalError {
                jurisdiction,
                reason: reason.clone(),
            });
        }
        self.calls().opened += 1;
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl DirectorySession for ScriptedDirectory {
    async fn search(
        &mut self,
        query: SearchQuery<'_>,
    ) -> Result<Vec<CandidateRef>, DirectoryQueryFailure> {
        self.calls()
            .searches
            .push((query.first_name.to_string(), query.last_name.to_string()));
        self.hits
            .get(&format!("{} {}", query.first_name, query.last_name))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_profile(
        &mut self,
        candidate: &CandidateRef,
    ) -> Result<ProfileDetails, DirectoryQueryFailure> {
        let fetched = {
            let mut calls = self.calls();
            calls.fetches.push(candidate.url.clone());
            calls.fetches.len()
        };
        if let Some((limit, token)) = &self.cancel_after_fetches {
            if fetched >= *limit {
                token.cancel();
            }
        }
        self.profiles
            .get(&candidate.url)
            .cloned()
            .unwrap_or_else(|| {
                Err(DirectoryQueryFailure::MissingElement(candidate.url.clone()))
            })
    }

    async fn close(&mut self) {
        self.calls().closed += 1;
    }
}

pub(super) fn log_lines(events: &[JobEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            JobEvent::Log(line) => Some(line.clone()),
            JobEvent::Results(_) => None,
        })
        .collect()
}

pub(super) async fn drain(sink: EventSink, rx: tokio::sync::mpsc::UnboundedReceiver<JobEvent>) -> Vec<JobEvent> {
    drop(sink);
    collect(rx).await
}
