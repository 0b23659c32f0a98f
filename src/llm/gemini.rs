use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerationError, TextGenerator};
use crate::config::LlmConfig;

/// Where the client gets its API key from
#[derive(Debug, Clone)]
enum ApiKey {
    Explicit(String),
    Env(String),
}

/// Adapter over the Generative Language `generateContent` endpoint.
///
/// Only the prompt and the temperature are sent; the endpoint rejects
/// client-side options such as retry counts, so none are forwarded.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: ApiKey,
}

impl GeminiClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &'static str = "gemma-3-12b-it";

    /// Client with a fixed API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: Self::DEFAULT_BASE_URL.into(),
            model: Self::DEFAULT_MODEL.into(),
            api_key: ApiKey::Explicit(api_key.into()),
        }
    }

    /// Client that reads its API key from `env_var` on every request
    pub fn from_env(env_var: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: Self::DEFAULT_BASE_URL.into(),
            model: Self::DEFAULT_MODEL.into(),
            api_key: ApiKey::Env(env_var.into()),
        }
    }

    /// Build a client from the `llm` section of the configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::from_env(&config.api_key_env)
            .with_client(client)
            .with_base_url(&config.base_url)
            .with_model(&config.model))
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn resolve_api_key(&self) -> Result<String, GenerationError> {
        match &self.api_key {
            ApiKey::Explicit(key) => Ok(key.clone()),
            ApiKey::Env(env_var) => std::env::var(env_var)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| GenerationError::MissingApiKey {
                    env_var: env_var.clone(),
                }),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        let api_key = self.resolve_api_key()?;
        let body = GenerateContentRequest::new(prompt, temperature);

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Sending generateContent request");

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(classify_error(status, &message));
        }

        let response = resp.json::<GenerateContentResponse>().await?;
        response.into_text()
    }

    fn ensure_credentials(&self) -> Result<(), GenerationError> {
        self.resolve_api_key().map(|_| ())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, temperature: f32) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String, GenerationError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".into());
            return Err(GenerationError::EmptyResponse(reason));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::EmptyResponse(
                candidate.finish_reason.unwrap_or_else(|| "empty content".into()),
            ));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Map a non-success response onto a [`GenerationError`].
///
/// HTTP 429 and `RESOURCE_EXHAUSTED` both mean the quota ran out.
fn classify_error(status: u16, body: &str) -> GenerationError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let api_status = parsed.as_ref().and_then(|e| e.error.status.clone());
    let message = parsed
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.to_string());

    if status == 429 || api_status.as_deref() == Some("RESOURCE_EXHAUSTED") {
        GenerationError::RateLimited(message)
    } else {
        GenerationError::Api { status, message }
    }
}
