// src/chat/gemini.rs
// =============================================================================
// Minimal Gemini `generateContent` client.
//
// Sends the whole conversation on every call with a fixed low temperature and
// medium-and-above safety blocking, and returns the reply text together with
// the token usage the API reports.
// =============================================================================

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Model used when none is given on the command line
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const TEMPERATURE: f32 = 0.2;

/// Errors from the model API
#[derive(Debug, Error)]
pub enum ChatError {
    /// Quota or rate limit hit (HTTP 429 / RESOURCE_EXHAUSTED)
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other error status returned by the API
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The prompt or the reply was blocked by safety filters
    #[error("response blocked: {0}")]
    Blocked(String),

    /// The model returned no text
    #[error("model returned an empty reply")]
    EmptyReply,
}

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// "user" or "model"
    #[serde(default)]
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role("user", text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role("model", text)
    }

    fn with_role(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct SafetySetting {
    category: HarmCategory,
    threshold: HarmBlockThreshold,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum HarmCategory {
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum HarmBlockThreshold {
    BlockMediumAndAbove,
}

fn default_safety_settings() -> Vec<SafetySetting> {
    [
        HarmCategory::HarmCategoryHarassment,
        HarmCategory::HarmCategoryHateSpeech,
        HarmCategory::HarmCategorySexuallyExplicit,
        HarmCategory::HarmCategoryDangerousContent,
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: HarmBlockThreshold::BlockMediumAndAbove,
    })
    .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: &'a [Content],
    generation_config: &'a GenerationConfig,
    safety_settings: &'a [SafetySetting],
}

/// Token counts reported for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Text and usage of one model reply
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub usage: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    fn into_reply(self) -> Result<ModelReply, ChatError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ChatError::Blocked(reason));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(ChatError::EmptyReply);
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return match candidate.finish_reason.as_deref() {
                Some("SAFETY") => Err(ChatError::Blocked("SAFETY".to_string())),
                _ => Err(ChatError::EmptyReply),
            };
        }

        Ok(ModelReply {
            text,
            usage: self.usage_metadata,
        })
    }
}

/// Gemini API client bound to one model
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[cfg(test)]
impl GeminiClient {
    /// Set the base URL (for testing only)
    pub fn set_base_url(&mut self, url: String) {
        self.base_url = url;
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
            safety_settings: default_safety_settings(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends the conversation so far and returns the next model turn
    #[instrument(
        skip(self, contents),
        level = "debug",
        fields(model = %self.model, turns = contents.len())
    )]
    pub async fn generate(&self, contents: &[Content]) -> Result<ModelReply, ChatError> {
        let url = format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, API_VERSION, self.model
        );

        let request = GenerateRequest {
            contents,
            generation_config: &self.generation_config,
            safety_settings: &self.safety_settings,
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "model response");

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        parsed.into_reply()
    }
}

// Maps an error response to a ChatError, singling out rate limiting
fn api_error(status: StatusCode, body: &str) -> ChatError {
    let detail = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);
    let message = detail
        .as_ref()
        .map(|d| d.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());
    let exhausted = detail.map_or(false, |d| d.status == "RESOURCE_EXHAUSTED");

    if status == StatusCode::TOO_MANY_REQUESTS || exhausted {
        ChatError::RateLimited(message)
    } else {
        ChatError::Api {
            status: status.as_u16(),
            message,
        }
    }
}
