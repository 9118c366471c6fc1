//! Per-record verification pipeline.
//!
//! A record moves through name cleaning, input validation, directory search
//! and candidate verification, ending in exactly one terminal status. Record
//! failures become `Processing Error` results; only cancellation escapes.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::directory::{DirectoryQueryFailure, DirectorySession, SearchQuery};
use super::domain::{InputRecord, Jurisdiction, VerificationResult, VerificationStatus};
use super::events::EventSink;
use super::matcher::CandidateMatcher;
use super::normalizer::NameNormalizer;

/// Cancellation was observed; the in-flight record produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("verification stopped by user request")]
pub struct Cancelled;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub results: Vec<VerificationResult>,
    pub stopped: bool,
}

pub struct VerificationOrchestrator<'a> {
    jurisdiction: Jurisdiction,
    normalizer: &'a NameNormalizer,
    matcher: CandidateMatcher,
    events: &'a EventSink,
    cancel: &'a CancellationToken,
}

impl<'a> VerificationOrchestrator<'a> {
    pub fn new(
        jurisdiction: Jurisdiction,
        normalizer: &'a NameNormalizer,
        events: &'a EventSink,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            jurisdiction,
            normalizer,
            matcher: CandidateMatcher::for_jurisdiction(jurisdiction),
            events,
            cancel,
        }
    }

    /// Runs every record in order, stopping at the first observed cancellation.
    pub async fn run(
        &self,
        session: &mut dyn DirectorySession,
        records: &[InputRecord],
    ) -> RunOutcome {
        let mut results = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            if record.is_blank() {
                continue;
            }

            let attempt = AssertUnwindSafe(self.process_one(&mut *session, index + 1, record))
                .catch_unwind()
                .await;
            match attempt {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(Cancelled)) => {
                    return RunOutcome {
                        results,
                        stopped: true,
                    }
                }
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    warn!(position = index + 1, %reason, "record processing panicked");
                    self.events
                        .log(format!("    -> An unexpected error occurred: {reason}"));
                    results.push(
                        VerificationResult::pending(record, self.jurisdiction)
                            .with_status(VerificationStatus::ProcessingError),
                    );
                }
            }
        }

        RunOutcome {
            results,
            stopped: false,
        }
    }

    pub async fn process_one(
        &self,
        session: &mut dyn DirectorySession,
        position: usize,
        record: &InputRecord,
    ) -> Result<VerificationResult, Cancelled> {
        self.checkpoint()?;
        self.events.log(format!(
            "\n  [Record {position}] Processing: '{} {}'",
            record.raw_first_name, record.last_name
        ));

        let result = VerificationResult::pending(record, self.jurisdiction);
        match self.verify(session, record, result.clone()).await {
            Ok(result) => Ok(result),
            Err(RecordError::Cancelled) => Err(Cancelled),
            Err(RecordError::Query(failure)) => {
                self.events
                    .log(format!("    -> An unexpected error occurred: {failure}"));
                Ok(result.with_status(VerificationStatus::ProcessingError))
            }
        }
    }

    async fn verify(
        &self,
        session: &mut dyn DirectorySession,
        record: &InputRecord,
        mut result: VerificationResult,
    ) -> Result<VerificationResult, RecordError> {
        let name = self
            .normalizer
            .normalize(&record.raw_first_name, &record.last_name, self.events)
            .await;

        if name.first_name.is_empty() || record.last_name.is_empty() || record.admit_date.is_empty()
        {
            self.events
                .log("    -> SKIPPED: Missing name or admit date after cleaning.");
            return Ok(result.with_status(VerificationStatus::MissingInputData));
        }

        let Some(target) = self.matcher.policy().parse_admit_date(&record.admit_date) else {
            self.events.log(format!(
                "    -> SKIPPED: Invalid date format '{}'.",
                record.admit_date
            ));
            return Ok(result.with_status(self.matcher.policy().invalid_date()));
        };

        self.checkpoint()?;
        self.events.log(format!(
            "    -> Searching for '{} {}'...",
            name.first_name, record.last_name
        ));
        let hits = session
            .search(SearchQuery {
                first_name: &name.first_name,
                last_name: &record.last_name,
            })
            .await?;

        if hits.is_empty() {
            self.events.log("    -> STATUS: Not Found on website.");
            return Ok(result.with_status(VerificationStatus::NotFound));
        }

        let candidates = if self.matcher.policy().coarse_filter {
            let candidates = self.matcher.prefilter(hits, &target);
            self.events.log(format!(
                "    -> Found {} potential profile(s) for admit month/year {}.",
                candidates.len(),
                target.period()
            ));
            candidates
        } else {
            self.events
                .log(format!("    -> Found {} potential profile(s).", hits.len()));
            hits
        };

        let total = candidates.len();
        let mut evaluation = self.matcher.begin();
        for (index, candidate) in candidates.iter().enumerate() {
            self.checkpoint()?;
            self.events.log(format!(
                "      -> [Candidate {}/{}] Verifying profile: {}",
                index + 1,
                total,
                candidate.url
            ));

            let profile = match session.fetch_profile(candidate).await {
                Ok(profile) => profile,
                Err(failure) => {
                    self.events.log(format!(
                        "      -> ERROR: Could not read profile {}: {failure}",
                        candidate.url
                    ));
                    evaluation.record_miss(candidate);
                    continue;
                }
            };

            self.events.log(format!(
                "        - Comparing website date '{}' with input date '{}'",
                self.matcher.describe(&profile),
                self.matcher.describe_target(&target)
            ));

            if self.matcher.matches_exactly(&target, &profile) {
                self.events
                    .log("        -> EXACT MATCH FOUND! Extracting details...");
                evaluation.record_match(candidate, profile);
                break;
            }
            evaluation.record_miss(candidate);
        }

        let resolution = self.matcher.resolve(evaluation);
        if resolution.status.is_match() {
            self.events
                .log(format!("        - Status: {}", resolution.status));
            self.events
                .log(format!("        - Discipline: {}", resolution.discipline));
        } else {
            self.events.log(format!(
                "    -> STATUS: {}. No profile with an exact admit date match was found.",
                resolution.status
            ));
        }

        result.status = resolution.status;
        result.discipline = resolution.discipline;
        result.matched_profile_link = resolution.matched_profile_link;
        result.unmatched_profile_links = resolution.unmatched_profile_links;
        Ok(result)
    }

    fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "record processing panicked".to_string()
    }
}

#[derive(Debug)]
enum RecordError {
    Cancelled,
    Query(DirectoryQueryFailure),
}

impl From<Cancelled> for RecordError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<DirectoryQueryFailure> for RecordError {
    fn from(value: DirectoryQueryFailure) -> Self {
        Self::Query(value)
    }
}
