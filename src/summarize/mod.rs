use serde::Serialize;
use std::fmt;

use crate::config::Config;
use crate::extractors::youtube::YoutubeTranscriptSource;
use crate::extractors::{
    extract_video_id, select_track, CaptionError, Transcript, TranscriptSource, VideoId,
    DEFAULT_MAX_CHARS,
};
use crate::llm::{generate_with_retry, GeminiClient, RetryPolicy, Sleeper, TextGenerator, TokioSleeper};
use crate::prompts;
use crate::GistError;

/// Model output for one transcript: a Markdown table or a gist paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary(String);

impl Summary {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Summary {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fetches transcripts and asks the model about them
pub struct Pipeline {
    source: Box<dyn TranscriptSource>,
    generator: Box<dyn TextGenerator>,
    sleeper: Box<dyn Sleeper>,
    policy: RetryPolicy,
    languages: Vec<String>,
    max_chars: usize,
    temperature: f32,
}

impl Pipeline {
    /// Pipeline with the default languages, cap, temperature and retry policy
    pub fn new(
        source: impl TranscriptSource + 'static,
        generator: impl TextGenerator + 'static,
    ) -> Self {
        Self {
            source: Box::new(source),
            generator: Box::new(generator),
            sleeper: Box::new(TokioSleeper),
            policy: RetryPolicy::default(),
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            max_chars: DEFAULT_MAX_CHARS,
            temperature: 0.7,
        }
    }

    /// YouTube captions plus the configured Generative Language model
    pub fn from_config(config: &Config) -> Result<Self, GistError> {
        let generator = GeminiClient::from_config(&config.llm)?;
        tracing::debug!(model = %generator.model(), "Using generative model");

        Ok(Self::new(YoutubeTranscriptSource::new(), generator)
            .with_languages(config.transcript.languages.clone())
            .with_max_chars(config.transcript.max_chars)
            .with_temperature(config.llm.temperature)
            .with_retry_policy(RetryPolicy::from_config(&config.retry)))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Fail before any network call when the model has no credential
    pub fn ensure_credentials(&self) -> Result<(), GistError> {
        Ok(self.generator.ensure_credentials()?)
    }

    /// Extract the video id from `url` and load its capped transcript
    pub async fn fetch_transcript(&self, url: &str) -> Result<Transcript, GistError> {
        let video_id =
            extract_video_id(url).ok_or_else(|| GistError::InvalidUrl(url.to_string()))?;

        tracing::info!(
            "Fetching {} transcript for video: {}",
            self.source.platform_name(),
            video_id
        );

        let transcript = self
            .load_transcript(&video_id)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to load transcript"))
            .map_err(|e| GistError::TranscriptUnavailable(e.to_string()))?;

        if transcript.is_truncated() {
            tracing::warn!("Transcript exceeded {} characters and was truncated", self.max_chars);
        }
        Ok(transcript)
    }

    async fn load_transcript(&self, video_id: &VideoId) -> Result<Transcript, CaptionError> {
        let tracks = self.source.list_transcripts(video_id).await?;
        let track = select_track(&tracks, &self.languages)?;
        let segments = self.source.fetch_segments(track).await?;

        tracing::debug!(
            "Loaded {} caption segments in {}",
            segments.len(),
            track.language_code
        );
        Ok(Transcript::from_segments(&segments, self.max_chars))
    }

    /// Ask the model for a comparison table or a gist of the transcript
    pub async fn generate_summary(&self, transcript: &Transcript) -> Result<Summary, GistError> {
        tracing::info!("Generating summary ({} characters)", transcript.char_count());
        let prompt = prompts::build_summary_prompt(transcript.as_str());
        self.generate(&prompt).await.map(Summary)
    }

    /// Answer a question from the transcript alone; history is caller-supplied
    pub async fn answer_question(
        &self,
        transcript: &Transcript,
        question: &str,
        chat_history: &str,
    ) -> Result<String, GistError> {
        tracing::info!("Answering question about transcript");
        let prompt = prompts::build_question_prompt(transcript.as_str(), question, chat_history);
        self.generate(&prompt).await
    }

    async fn generate(&self, prompt: &str) -> Result<String, GistError> {
        generate_with_retry(
            self.generator.as_ref(),
            prompt,
            self.temperature,
            &self.policy,
            self.sleeper.as_ref(),
        )
        .await
    }
}
