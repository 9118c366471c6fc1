use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::normalizer::{ApiCredential, CleaningFailure, CleaningRequest, NameCleaner};
use crate::config::AiConfig;

/// `NameCleaner` backed by the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiCleaner {
    client: reqwest::Client,
    config: AiConfig,
}

impl GeminiCleaner {
    pub fn new(config: AiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl NameCleaner for GeminiCleaner {
    async fn clean(
        &self,
        request: CleaningRequest<'_>,
        credential: &ApiCredential,
    ) -> Result<String, CleaningFailure> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt(request) }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    CleaningFailure::Timeout(self.config.timeout)
                } else {
                    CleaningFailure::Transport(err.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CleaningFailure::Transport(format!("HTTP {status}")));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| CleaningFailure::Malformed(err.without_url().to_string()))?;
        let text = payload
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .find_map(|part| part.text)
            .ok_or(CleaningFailure::Empty)?;

        parse_cleaned_name(&text)
    }
}

fn prompt(request: CleaningRequest<'_>) -> String {
    format!(
        r#"You are an expert data cleaner preparing names for a legal directory search.
Extract the most probable first name and ensure it contains ONLY alphabetic characters.
- Remove all non-alphabetic symbols such as periods, hyphens, and quotation marks.
- For "W. Michael", the first name is "Michael".
- For "Joseph 'Joe'", the first name is "Joseph".
- For a single initial like "R.", the first name is "R".
- For a hyphenated name like "Mary-Beth", the first name is "Mary".
First Name (raw): "{}"
Last Name: "{}"
Return a JSON object with a single key "cleaned_first_name"."#,
        request.raw_first_name, request.last_name
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CleanedName {
    cleaned_first_name: Option<String>,
}

/// Model text may arrive wrapped in a ```json fence.
fn parse_cleaned_name(text: &str) -> Result<String, CleaningFailure> {
    let stripped = text.trim().replace("```json", "").replace("```", "");
    let parsed: CleanedName = serde_json::from_str(stripped.trim())
        .map_err(|err| CleaningFailure::Malformed(err.to_string()))?;
    parsed
        .cleaned_first_name
        .filter(|name| !name.trim().is_empty())
        .ok_or(CleaningFailure::Empty)
}
