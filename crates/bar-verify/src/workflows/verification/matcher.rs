//! Exact-match policy applied to the candidates of a single record.
//!
//! The two directories disagree on how an admission date is compared, on
//! coarse pre-filtering, and on the status reported when nothing matches.
//! Each directory's behavior is captured in its [`DirectoryPolicy`] rather
//! than unified; the divergence is pending a product decision.

use super::domain::{
    parse_calendar_date, AdmitDate, ADMIT_DATE_FORMATS, CandidateRef, Jurisdiction, ProfileDetails,
    VerificationStatus,
};

const EMPTY_DISCIPLINE_LABEL: &str = "No discipline found";

/// Text comparison only works when the input uses the directory's own layout.
const DIRECTORY_TEXT_FORMATS: &[&str] = &["%m/%d/%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComparison {
    /// Both sides canonicalized to a calendar date before comparing.
    Calendar,
    /// Trimmed profile text must equal the trimmed input text.
    ExactText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryPolicy {
    pub comparison: DateComparison,
    /// `chrono` layouts an input admit date may use.
    pub input_formats: &'static [&'static str],
    /// Candidates must carry a listed period equal to the target's.
    pub coarse_filter: bool,
    pub invalid_date_status: InvalidDateStatus,
    pub no_match_status: NoMatchStatus,
    pub label_empty_discipline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDateStatus {
    InvalidInputDateFormat,
    ErrorInvalidDateFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchStatus {
    VerificationFailed,
    AdmitDateMismatch,
}

impl DirectoryPolicy {
    pub const fn for_jurisdiction(jurisdiction: Jurisdiction) -> Self {
        match jurisdiction {
            Jurisdiction::Georgia => Self {
                comparison: DateComparison::Calendar,
                input_formats: ADMIT_DATE_FORMATS,
                coarse_filter: false,
                invalid_date_status: InvalidDateStatus::ErrorInvalidDateFormat,
                no_match_status: NoMatchStatus::AdmitDateMismatch,
                label_empty_discipline: false,
            },
            Jurisdiction::California => Self {
                comparison: DateComparison::ExactText,
                input_formats: DIRECTORY_TEXT_FORMATS,
                coarse_filter: true,
                invalid_date_status: InvalidDateStatus::InvalidInputDateFormat,
                no_match_status: NoMatchStatus::VerificationFailed,
                label_empty_discipline: true,
            },
        }
    }

    pub fn parse_admit_date(&self, raw: &str) -> Option<AdmitDate> {
        AdmitDate::parse_with(raw, self.input_formats)
    }

    pub fn invalid_date(&self) -> VerificationStatus {
        match self.invalid_date_status {
            InvalidDateStatus::InvalidInputDateFormat => VerificationStatus::InvalidInputDateFormat,
            InvalidDateStatus::ErrorInvalidDateFormat => VerificationStatus::ErrorInvalidDateFormat,
        }
    }

    pub fn no_match(&self) -> VerificationStatus {
        match self.no_match_status {
            NoMatchStatus::VerificationFailed => VerificationStatus::VerificationFailed,
            NoMatchStatus::AdmitDateMismatch => VerificationStatus::AdmitDateMismatch,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CandidateMatcher {
    policy: DirectoryPolicy,
}

impl CandidateMatcher {
    pub fn new(policy: DirectoryPolicy) -> Self {
        Self { policy }
    }

    pub fn for_jurisdiction(jurisdiction: Jurisdiction) -> Self {
        Self::new(DirectoryPolicy::for_jurisdiction(jurisdiction))
    }

    pub fn policy(&self) -> &DirectoryPolicy {
        &self.policy
    }

    /// Drops candidates whose listed period is missing or differs from the
    /// target's, preserving order.
    pub fn prefilter(&self, candidates: Vec<CandidateRef>, target: &AdmitDate) -> Vec<CandidateRef> {
        if !self.policy.coarse_filter {
            return candidates;
        }

        let period = target.period();
        candidates
            .into_iter()
            .filter(|candidate| candidate.coarse_period == Some(period))
            .collect()
    }

    pub fn matches_exactly(&self, target: &AdmitDate, profile: &ProfileDetails) -> bool {
        let listed = profile.admit_date_text.trim();
        match self.policy.comparison {
            DateComparison::Calendar => {
                parse_calendar_date(listed).map_or(false, |date| date == target.date())
            }
            DateComparison::ExactText => !listed.is_empty() && listed == target.text(),
        }
    }

    /// Renders the value compared against the target, for the job log.
    pub fn describe(&self, profile: &ProfileDetails) -> String {
        let listed = profile.admit_date_text.trim();
        match self.policy.comparison {
            DateComparison::Calendar => match parse_calendar_date(listed) {
                Some(date) => date.format("%-m/%-d/%Y").to_string(),
                None => listed.to_string(),
            },
            DateComparison::ExactText => listed.to_string(),
        }
    }

    pub fn describe_target(&self, target: &AdmitDate) -> String {
        match self.policy.comparison {
            DateComparison::Calendar => target.date().format("%-m/%-d/%Y").to_string(),
            DateComparison::ExactText => target.text().to_string(),
        }
    }

    pub fn begin(&self) -> CandidateEvaluation {
        CandidateEvaluation {
            visited: Vec::new(),
            matched: None,
        }
    }

    /// Terminal status, discipline, and link for a finished evaluation.
    pub fn resolve(&self, evaluation: CandidateEvaluation) -> MatchResolution {
        match evaluation.matched {
            Some((url, profile)) => {
                let discipline = profile.discipline.trim();
                let discipline = if discipline.is_empty() && self.policy.label_empty_discipline {
                    EMPTY_DISCIPLINE_LABEL.to_string()
                } else {
                    discipline.to_string()
                };
                MatchResolution {
                    status: VerificationStatus::Reported(profile.status.trim().to_string()),
                    discipline,
                    matched_profile_link: Some(url),
                    unmatched_profile_links: evaluation.visited,
                }
            }
            None => MatchResolution {
                status: self.policy.no_match(),
                discipline: String::new(),
                matched_profile_link: None,
                unmatched_profile_links: evaluation.visited,
            },
        }
    }
}

/// Visit ledger for one record. Once a match is recorded no further visits
/// are accepted.
#[derive(Debug, Clone, Default)]
pub struct CandidateEvaluation {
    visited: Vec<String>,
    matched: Option<(String, ProfileDetails)>,
}

impl CandidateEvaluation {
    pub fn record_miss(&mut self, candidate: &CandidateRef) {
        if self.matched.is_none() {
            self.visited.push(candidate.url.clone());
        }
    }

    pub fn record_match(&mut self, candidate: &CandidateRef, profile: ProfileDetails) {
        if self.matched.is_none() {
            self.matched = Some((candidate.url.clone(), profile));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResolution {
    pub status: VerificationStatus,
    pub discipline: String,
    pub matched_profile_link: Option<String>,
    pub unmatched_profile_links: Vec<String>,
}
