//! An `Oracle` backed by a Gemini style `generateContent` HTTP endpoint.

use async_trait::async_trait;
use kashi::{
    error::OracleError,
    oracle::{Credentials, Oracle, Refinement, Verification, VerifyRequest},
    ParsedLine,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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

pub struct HttpOracle {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpOracle {
    pub fn new(base_url: impl Into<String>) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|err| OracleError::Unavailable(err.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Sends the prompt and returns the text of the first candidate.
    async fn generate(&self, credentials: &Credentials, prompt: &str) -> Result<String, OracleError> {
        if !credentials.is_usable() {
            return Err(OracleError::MissingCredentials);
        }
        let model = credentials.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let url = format!(
            "{}/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        tracing::debug!("Sending prompt to {url}");
        let response = self
            .http_client
            .post(&url)
            .query(&[("key", credentials.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Http(status.as_u16()));
        }

        let response = response
            .json::<GenerateResponse>()
            .await
            .map_err(map_reqwest_error)?;
        let text = response
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .ok_or_else(|| OracleError::Malformed("no candidates in response".to_string()))?;
        Ok(strip_code_fence(&text).to_string())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout(TIMEOUT)
    } else if err.is_decode() {
        OracleError::Malformed(err.to_string())
    } else {
        OracleError::Unavailable(err.to_string())
    }
}

// models like to wrap JSON in a markdown code block even when asked not to
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn refine_prompt(raw_text: &str, lines: &[ParsedLine]) -> Result<String, OracleError> {
    let lines = serde_json::to_string(lines)?;
    Ok(format!(
        "You are given Japanese song lyrics and a draft tokenization of them.\n\
         Fix token boundaries, readings (hiragana), romaji and add short English definitions for kanji.\n\
         Keep the ids of tokens you don't split or merge. Token types are one of \
         kanji, hiragana, katakana, latin, number, punctuation.\n\
         Respond with JSON of the form \
         {{\"parsedLines\": [[{{\"id\", \"text\", \"type\", \"reading\", \"romaji\", \"definition\"}}]], \
         \"translations\": [\"one English translation per line\"]}}.\n\n\
         Lyrics:\n{raw_text}\n\nDraft:\n{lines}"
    ))
}

fn verify_prompt(request: &VerifyRequest) -> String {
    format!(
        "In the Japanese line \"{}\", what is the reading of \"{}\"?\n\
         Respond with JSON of the form \
         {{\"reading\": \"hiragana reading\", \"definition\": \"short English definition\", \
         \"notes\": \"usage notes\"}}, or null if the text is not Japanese.",
        request.line_context, request.token_text
    )
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn refine(
        &self,
        credentials: &Credentials,
        raw_text: &str,
        lines: &[ParsedLine],
    ) -> Result<Refinement, OracleError> {
        let prompt = refine_prompt(raw_text, lines)?;
        let text = self.generate(credentials, &prompt).await?;
        Refinement::from_json(&text)
    }

    async fn verify(
        &self,
        credentials: &Credentials,
        request: &VerifyRequest,
        cancel: CancellationToken,
    ) -> Result<Option<Verification>, OracleError> {
        let prompt = verify_prompt(request);
        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("{} cancelled", request.request_id);
                return Err(OracleError::Cancelled);
            }
            text = self.generate(credentials, &prompt) => text?,
        };
        let verification = serde_json::from_str::<Option<Verification>>(&text)?;
        Ok(verification.filter(|v| !v.reading.trim().is_empty()))
    }
}
