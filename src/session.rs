//! Per-user interactive state: the last processed URL and its results.

use uuid::Uuid;

use crate::extractors::Transcript;
use crate::summarize::{Pipeline, Summary};
use crate::GistError;

/// Where the current submission is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    FetchingTranscript,
    GeneratingSummary,
    Done,
    Error(String),
}

/// Result of [`Session::submit`]
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The URL is empty or was already processed; cached results stand
    Unchanged,

    /// Transcript and summary were replaced
    Completed,

    /// The submission failed; previous results are untouched
    Failed(GistError),
}

/// Session-scoped results, written only by [`Session::submit`]
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: SessionState,
    transcript: Option<Transcript>,
    summary: Option<Summary>,
    last_url: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            transcript: None,
            summary: None,
            last_url: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    /// Process a URL: fetch its transcript, then summarize it.
    ///
    /// Re-submitting the last processed URL is a no-op. Results are only
    /// replaced when both the transcript and the summary were produced.
    pub async fn submit(&mut self, url: &str, pipeline: &Pipeline) -> SubmitOutcome {
        if url.is_empty() || self.last_url.as_deref() == Some(url) {
            tracing::debug!(session = %self.id, "URL already processed, keeping cached results");
            return SubmitOutcome::Unchanged;
        }

        match self.run(url, pipeline).await {
            Ok((transcript, summary)) => {
                self.transcript = Some(transcript);
                self.summary = Some(summary);
                self.last_url = Some(url.to_string());
                self.state = SessionState::Done;
                SubmitOutcome::Completed
            }
            Err(err) => {
                tracing::error!(session = %self.id, error = %err, "Submission failed");
                self.state = SessionState::Error(err.user_message());
                SubmitOutcome::Failed(err)
            }
        }
    }

    async fn run(&mut self, url: &str, pipeline: &Pipeline) -> Result<(Transcript, Summary), GistError> {
        pipeline.ensure_credentials()?;

        self.state = SessionState::FetchingTranscript;
        let transcript = pipeline.fetch_transcript(url).await?;

        self.state = SessionState::GeneratingSummary;
        let summary = pipeline.generate_summary(&transcript).await?;

        Ok((transcript, summary))
    }

    /// Ask a question about the current transcript
    pub async fn ask(
        &self,
        question: &str,
        chat_history: &str,
        pipeline: &Pipeline,
    ) -> Result<String, GistError> {
        let transcript = self.transcript.as_ref().ok_or(GistError::NoTranscript)?;
        pipeline.ensure_credentials()?;
        pipeline.answer_question(transcript, question, chat_history).await
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
