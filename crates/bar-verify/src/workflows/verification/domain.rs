use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every date layout recognised on either side of a calendar comparison.
pub const ADMIT_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%m-%d-%Y", "%B %d, %Y", "%b %d, %Y"];

/// State bar directory a job is verified against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jurisdiction {
    Georgia,
    California,
}

impl Jurisdiction {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Georgia => "georgia",
            Self::California => "california",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Georgia => "Georgia",
            Self::California => "California",
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported state '{0}', expected georgia or california")]
pub struct UnknownJurisdiction(pub String);

impl FromStr for Jurisdiction {
    type Err = UnknownJurisdiction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "georgia" => Ok(Self::Georgia),
            "california" => Ok(Self::California),
            _ => Err(UnknownJurisdiction(value.to_string())),
        }
    }
}

/// One typed input row. Rows with both names blank never become records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub raw_first_name: String,
    pub last_name: String,
    pub admit_date: String,
}

impl InputRecord {
    pub fn new(
        raw_first_name: impl Into<String>,
        last_name: impl Into<String>,
        admit_date: impl Into<String>,
    ) -> Self {
        Self {
            raw_first_name: raw_first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
            admit_date: admit_date.into().trim().to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.raw_first_name.is_empty() && self.last_name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub first_name: String,
    pub used_fallback: bool,
}

/// Target admission date: the caller's text plus its calendar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmitDate {
    text: String,
    date: NaiveDate,
}

impl AdmitDate {
    pub fn parse(raw: &str) -> Option<Self> {
        Self::parse_with(raw, ADMIT_DATE_FORMATS)
    }

    /// Accepts only the given `chrono` layouts.
    pub fn parse_with(raw: &str, formats: &[&str]) -> Option<Self> {
        let text = raw.trim();
        parse_date_with(text, formats).map(|date| Self {
            text: text.to_string(),
            date,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn period(&self) -> CoarsePeriod {
        CoarsePeriod {
            month: self.date.month(),
            year: self.date.year(),
        }
    }
}

/// Canonicalize a textual date into a calendar date.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    parse_date_with(raw, ADMIT_DATE_FORMATS)
}

fn parse_date_with(raw: &str, formats: &[&str]) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Month/year admission period some directories list next to a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoarsePeriod {
    pub month: u32,
    pub year: i32,
}

impl CoarsePeriod {
    /// Parses listings such as `January 2010` or `Jan 2010`.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        let padded = format!("1 {text}");
        ["%d %B %Y", "%d %b %Y"]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(&padded, format).ok())
            .map(|date| Self {
                month: date.month(),
                year: date.year(),
            })
    }
}

impl fmt::Display for CoarsePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(date) => write!(f, "{}", date.format("%B %Y")),
            None => write!(f, "{:02}/{}", self.month, self.year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRef {
    pub url: String,
    pub coarse_period: Option<CoarsePeriod>,
}

impl CandidateRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            coarse_period: None,
        }
    }

    pub fn with_period(mut self, period: CoarsePeriod) -> Self {
        self.coarse_period = Some(period);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub status: String,
    pub discipline: String,
    pub admit_date_text: String,
}

/// Terminal status of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    MissingInputData,
    InvalidInputDateFormat,
    ErrorInvalidDateFormat,
    NotFound,
    VerificationFailed,
    AdmitDateMismatch,
    ProcessingError,
    /// Status text read off a matched profile, passed through verbatim.
    Reported(String),
}

impl VerificationStatus {
    pub fn label(&self) -> &str {
        match self {
            Self::MissingInputData => "Missing Input Data",
            Self::InvalidInputDateFormat => "Invalid Input Date Format",
            Self::ErrorInvalidDateFormat => "Error - Invalid Date Format",
            Self::NotFound => "Not Found",
            Self::VerificationFailed => "Verification Failed",
            Self::AdmitDateMismatch => "Admit Date Mismatch",
            Self::ProcessingError => "Processing Error",
            Self::Reported(status) => status,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Reported(_))
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub first_name: String,
    pub last_name: String,
    pub admit_date: String,
    pub state: Jurisdiction,
    pub status: VerificationStatus,
    pub discipline: String,
    pub matched_profile_link: Option<String>,
    pub unmatched_profile_links: Vec<String>,
}

impl VerificationResult {
    /// Result skeleton for a record; callers fill the terminal fields.
    pub fn pending(record: &InputRecord, state: Jurisdiction) -> Self {
        Self {
            first_name: record.raw_first_name.clone(),
            last_name: record.last_name.clone(),
            admit_date: record.admit_date.clone(),
            state,
            status: VerificationStatus::ProcessingError,
            discipline: String::new(),
            matched_profile_link: None,
            unmatched_profile_links: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: VerificationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn row(&self) -> ResultRow {
        ResultRow {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            admit_date: self.admit_date.clone(),
            state: self.state,
            status: self.status.label().to_string(),
            discipline: self.discipline.clone(),
            profile_links: self.matched_profile_link.clone().unwrap_or_default(),
            unmatched_profile_links: self.unmatched_profile_links.join(", "),
        }
    }
}

/// Column names of [`ResultRow`] in serialisation order.
pub const RESULT_COLUMNS: [&str; 8] = [
    "first name",
    "last name",
    "admit date",
    "state",
    "status",
    "discipline",
    "profile links",
    "unmatched profile links",
];

/// Consumer-facing result shape. Field order is part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "first name")]
    pub first_name: String,
    #[serde(rename = "last name")]
    pub last_name: String,
    #[serde(rename = "admit date")]
    pub admit_date: String,
    pub state: Jurisdiction,
    pub status: String,
    pub discipline: String,
    #[serde(rename = "profile links")]
    pub profile_links: String,
    #[serde(rename = "unmatched profile links")]
    pub unmatched_profile_links: String,
}

/// Headline counts over a finished result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub total: usize,
    pub matched: usize,
    pub not_found: usize,
    pub unverified: usize,
    pub errors: usize,
}

impl ResultSummary {
    pub fn from_results(results: &[VerificationResult]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, result| {
                summary.total += 1;
                match &result.status {
                    VerificationStatus::Reported(_) => summary.matched += 1,
                    VerificationStatus::NotFound => summary.not_found += 1,
                    VerificationStatus::VerificationFailed
                    | VerificationStatus::AdmitDateMismatch => summary.unverified += 1,
                    VerificationStatus::MissingInputData
                    | VerificationStatus::InvalidInputDateFormat
                    | VerificationStatus::ErrorInvalidDateFormat
                    | VerificationStatus::ProcessingError => summary.errors += 1,
                }
                summary
            })
    }
}
