//! Video Gist - A Rust CLI tool for summarizing YouTube videos
//!
//! This library fetches a video's captions, hands the transcript to a hosted
//! generative model and returns either a Markdown comparison table or a short
//! gist of the video. Follow-up questions about the transcript are answered by
//! the same model.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod llm;
pub mod output;
pub mod prompts;
pub mod session;
pub mod summarize;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{extract_video_id, Transcript, TranscriptSource, VideoId};
pub use llm::{GenerationError, TextGenerator};
pub use session::{Session, SessionState, SubmitOutcome};
pub use summarize::{Pipeline, Summary};

/// Result type used for configuration and binary plumbing
pub type Result<T> = anyhow::Result<T>;

/// Error types surfaced by the summarization pipeline
#[derive(thiserror::Error, Debug)]
pub enum GistError {
    #[error("API key is missing: set the {env_var} environment variable (or add it to your .env file)")]
    MissingApiKey { env_var: String },

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load transcript: {0}")]
    TranscriptUnavailable(String),

    #[error("Model is still rate limited after {attempts} attempts: {last_error}")]
    RetryExhausted {
        attempts: u32,
        last_error: GenerationError,
    },

    #[error("Generation failed: {0}")]
    Generation(GenerationError),

    #[error("No transcript loaded yet; summarize a video first")]
    NoTranscript,
}

impl From<GenerationError> for GistError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::MissingApiKey { env_var } => GistError::MissingApiKey { env_var },
            other => GistError::Generation(other),
        }
    }
}

impl GistError {
    /// Text shown to the user when a submission fails
    pub fn user_message(&self) -> String {
        match self {
            GistError::RetryExhausted { .. } => {
                "API Quota Exceeded. Please try again later or use a shorter video.".to_string()
            }
            other => format!("Error: {}", other),
        }
    }
}
