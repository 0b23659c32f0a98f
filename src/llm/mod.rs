use async_trait::async_trait;

pub mod gemini;
pub mod retry;

pub use gemini::GeminiClient;
pub use retry::{generate_with_retry, RetryPolicy, Sleeper, TokioSleeper};

/// Failures reported by a text generation backend
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Resource exhausted: {0}")]
    RateLimited(String),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Model returned no text: {0}")]
    EmptyResponse(String),
}

impl GenerationError {
    /// Whether the backend signalled quota or rate exhaustion
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerationError::RateLimited(_))
    }
}

/// A hosted model that turns a prompt into text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Submit a fully rendered prompt and return the raw generated text
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError>;

    /// Fail fast, before any network call, when no credential is available
    fn ensure_credentials(&self) -> Result<(), GenerationError> {
        Ok(())
    }
}
