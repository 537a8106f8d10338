use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::config::GeminiConfig;
use std::time::Duration;
use tracing::{debug, error, info};

pub mod error;

pub use error::{GenerationError, Result};

/// Shown whenever a tip cannot be generated
pub const FALLBACK_TIP: &str = "Check out this cool spot!";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Gemini client for short location tips shown on the reveal
pub struct TipClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
    max_retries: u32,
    initial_backoff_ms: u64,
}

/// generateContent request structure
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// generateContent response structure
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl TipClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            max_retries: 1,
            initial_backoff_ms: 500,
        }
    }

    pub fn from_config(config: &GeminiConfig) -> Self {
        Self::new(config.api_key.clone(), config.model.clone())
    }

    /// Point at a different API root (proxies, tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_retry_config(mut self, max_retries: u32, initial_backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff_ms = initial_backoff_ms;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// A one-line tip for a campus location. Never fails: errors are logged
    /// and replaced with [`FALLBACK_TIP`].
    pub async fn campus_tip(&self, location_name: &str) -> String {
        match self.generate_tip(location_name).await {
            Ok(tip) => tip,
            Err(GenerationError::NotConfigured) => {
                debug!("No tip API key configured, using fallback tip");
                FALLBACK_TIP.to_string()
            }
            Err(e) => {
                error!("Tip generation failed for {}: {}", location_name, e);
                FALLBACK_TIP.to_string()
            }
        }
    }

    /// Generate a tip, surfacing the failure instead of falling back
    pub async fn generate_tip(&self, location_name: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::NotConfigured)?;

        info!("Requesting campus tip for {}", location_name);
        let prompt = build_prompt(location_name);

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            match self.call_api(api_key, &prompt).await {
                Ok(tip) => return Ok(tip),
                Err(e) => {
                    if attempt < self.max_retries {
                        let backoff_ms = self.initial_backoff_ms * 2_u64.pow(attempt);
                        error!(
                            "Tip API call failed (attempt {}/{}), retrying in {}ms: {}",
                            attempt + 1,
                            self.max_retries + 1,
                            backoff_ms,
                            e
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(GenerationError::EmptyResponse))
    }

    async fn call_api(&self, api_key: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

pub fn build_prompt(location_name: &str) -> String {
    format!(
        "I am a student at Galgotias University standing at the {}. \
         Give me one short, secret \"Pro Tip\" for this specific location. \
         Keep it under 20 words. Be helpful.",
        location_name
    )
}

/// Join the text parts of the first candidate
pub fn parse_response(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Request(format!("Failed to parse tip response: {}", e)))?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text.to_string())
}
