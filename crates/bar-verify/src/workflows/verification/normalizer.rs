use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::domain::NormalizedName;
use super::events::EventSink;

const PLACEHOLDER_KEY: &str = "YOUR_API_KEY";

/// Per-job credential for the name-cleaning collaborator.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    pub fn is_configured(&self) -> bool {
        !self.0.is_empty() && !self.0.contains(PLACEHOLDER_KEY)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiCredential(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningRequest<'a> {
    pub raw_first_name: &'a str,
    pub last_name: &'a str,
}

/// Why the collaborator's answer was not used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CleaningFailure {
    #[error("API key not configured")]
    NotConfigured,
    #[error("AI cleaning timed out after {0:?}")]
    Timeout(Duration),
    #[error("AI cleaning error: {0}")]
    Transport(String),
    #[error("AI returned a malformed response: {0}")]
    Malformed(String),
    #[error("AI returned an empty response")]
    Empty,
    #[error("AI returned non-alphabetic name '{0}'")]
    NonAlphabetic(String),
}

/// AI collaborator contract: returns a cleaned first name or fails.
#[async_trait]
pub trait NameCleaner: Send + Sync {
    async fn clean(
        &self,
        request: CleaningRequest<'_>,
        credential: &ApiCredential,
    ) -> Result<String, CleaningFailure>;
}

/// Cleans first names through the collaborator, falling back to local rules.
pub struct NameNormalizer {
    cleaner: Arc<dyn NameCleaner>,
    credential: ApiCredential,
    budget: Duration,
}

impl NameNormalizer {
    pub fn new(cleaner: Arc<dyn NameCleaner>, credential: ApiCredential, budget: Duration) -> Self {
        Self {
            cleaner,
            credential,
            budget,
        }
    }

    pub async fn normalize(
        &self,
        raw_first_name: &str,
        last_name: &str,
        events: &EventSink,
    ) -> NormalizedName {
        match self.clean_with_ai(raw_first_name, last_name).await {
            Ok(first_name) => {
                events.log(format!(
                    "    -> AI cleaned '{raw_first_name}' to '{first_name}'."
                ));
                NormalizedName {
                    first_name,
                    used_fallback: false,
                }
            }
            Err(failure) => {
                events.log(format!("    -> WARNING: {failure}. Using basic cleaning."));
                NormalizedName {
                    first_name: fallback_first_name(raw_first_name),
                    used_fallback: true,
                }
            }
        }
    }

    async fn clean_with_ai(
        &self,
        raw_first_name: &str,
        last_name: &str,
    ) -> Result<String, CleaningFailure> {
        if !self.credential.is_configured() {
            return Err(CleaningFailure::NotConfigured);
        }

        let request = CleaningRequest {
            raw_first_name,
            last_name,
        };
        let cleaned = tokio::time::timeout(
            self.budget,
            self.cleaner.clean(request, &self.credential),
        )
        .await
        .map_err(|_| CleaningFailure::Timeout(self.budget))??;

        validate_cleaned(cleaned)
    }
}

fn validate_cleaned(cleaned: String) -> Result<String, CleaningFailure> {
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        return Err(CleaningFailure::Empty);
    }
    if !cleaned.chars().all(char::is_alphabetic) {
        return Err(CleaningFailure::NonAlphabetic(cleaned));
    }
    Ok(cleaned)
}

/// First whitespace-delimited token with every non-alphabetic char removed.
pub fn fallback_first_name(raw_first_name: &str) -> String {
    raw_first_name
        .split_whitespace()
        .next()
        .map(|token| token.chars().filter(|c| c.is_alphabetic()).collect())
        .unwrap_or_default()
}
