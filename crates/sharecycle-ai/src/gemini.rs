//! Hosted generative-model scorer (Gemini `generateContent` REST API).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sharecycle_core::{CandidatePairing, Donation, Request};
use tracing::{info, warn};

use crate::{Scorer, ScoringError, build_prompt, parse_candidates, response_schema};

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for [`GeminiScorer`].
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ScoringConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ── Wire types ──

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GenerateCandidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct GenerateCandidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

/// Asks a hosted model for candidate pairings.
pub struct GeminiScorer {
    client: reqwest::Client,
    config: ScoringConfig,
}

impl GeminiScorer {
    /// Fails only if the HTTP client cannot be built (TLS backend init).
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            config: ScoringConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    async fn generate(&self, api_key: &str, prompt: String) -> Result<String, ScoringError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
                "temperature": 0.0
            }
        });

        let url = self.endpoint();
        info!(url = %url, model = %self.config.model, "requesting candidate pairings");
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScoringError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let raw = resp.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: GenerateResponse = serde_json::from_str(&raw)
            .map_err(|e| ScoringError::MalformedResponse(format!("unexpected envelope: {e}")))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ScoringError::MalformedResponse(format!(
                "prompt blocked: {reason}"
            )));
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        Ok(text)
    }

    fn transport_error(&self, e: reqwest::Error) -> ScoringError {
        if e.is_timeout() {
            ScoringError::Timeout(self.config.timeout)
        } else {
            ScoringError::Http(e)
        }
    }
}

#[async_trait]
impl Scorer for GeminiScorer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn score(
        &self,
        donations: &[Donation],
        requests: &[Request],
    ) -> Result<Vec<CandidatePairing>, ScoringError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(k) if !k.trim().is_empty() => k,
            _ => {
                return Err(ScoringError::Unavailable(
                    "API key is not configured".to_string(),
                ));
            }
        };

        let prompt = build_prompt(donations, requests);
        let text = self.generate(api_key, prompt).await?;
        let candidates = parse_candidates(&text).inspect_err(|e| {
            let head: String = text.chars().take(200).collect();
            warn!(error = %e, raw = %head, "rejected scorer output");
        })?;

        info!(count = candidates.len(), "received candidate pairings");
        Ok(candidates)
    }
}
