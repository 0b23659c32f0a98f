use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub mod youtube;

/// Marker appended to transcripts cut at the character cap
pub const TRUNCATION_MARKER: &str = "... [Truncated to save tokens]";

/// Default transcript cap, in characters
pub const DEFAULT_MAX_CHARS: usize = 20_000;

/// Identifier of a single YouTube video
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page for this video
    pub fn watch_url(&self) -> String {
        format!(
            "https://www.youtube.com/watch?v={}",
            urlencoding::encode(&self.0)
        )
    }

    /// Thumbnail image link, used in place of an embedded player
    pub fn thumbnail_url(&self) -> String {
        format!(
            "https://img.youtube.com/vi/{}/hqdefault.jpg",
            urlencoding::encode(&self.0)
        )
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the video identifier from a YouTube URL.
///
/// Recognizes `youtu.be/<id>`, `youtube.com/watch?v=<id>`,
/// `youtube.com/embed/<id>` and `youtube.com/v/<id>`. Anything else,
/// including strings that don't parse as URLs, yields `None`.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let path = parsed.path();

    let id = match host {
        "youtu.be" => path.get(1..)?.to_string(),
        "www.youtube.com" | "youtube.com" => {
            if path == "/watch" {
                parsed
                    .query_pairs()
                    .find(|(key, value)| key == "v" && !value.is_empty())
                    .map(|(_, value)| value.into_owned())?
            } else if path.starts_with("/embed/") || path.starts_with("/v/") {
                path.split('/').nth(2)?.to_string()
            } else {
                return None;
            }
        }
        _ => return None,
    };

    if id.is_empty() {
        None
    } else {
        Some(VideoId(id))
    }
}

/// A caption track advertised for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language tag, e.g. `en` or `en-GB`
    pub language_code: String,

    /// Human readable language name
    pub language: String,

    /// Auto-generated (speech recognition) rather than uploaded captions
    pub is_generated: bool,

    /// Where the caption text can be downloaded from
    pub base_url: String,
}

/// One timed piece of caption text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Failures from the caption backend
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("The video is no longer available ({0})")]
    VideoUnavailable(String),

    #[error("The video is unplayable: {0}")]
    VideoUnplayable(String),

    #[error("Subtitles are disabled for this video ({0})")]
    TranscriptsDisabled(String),

    #[error("No transcript found for any of the requested languages {requested:?}; available: {available:?}")]
    NoTranscriptFound {
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("YouTube is blocking requests from this IP")]
    RequestBlocked,

    #[error("Failed to accept the YouTube consent page")]
    ConsentRequired,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Could not parse the YouTube response: {0}")]
    Unparsable(String),
}

/// Backend that lists and downloads captions for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// List every caption track available for the video
    async fn list_transcripts(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, CaptionError>;

    /// Download the ordered caption segments of a track
    async fn fetch_segments(&self, track: &CaptionTrack) -> Result<Vec<CaptionSegment>, CaptionError>;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}

/// Pick the first track matching the language priority list.
///
/// For each language, uploaded captions win over auto-generated ones.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Result<&'a CaptionTrack, CaptionError> {
    for language in languages {
        let mut candidates = tracks.iter().filter(|t| &t.language_code == language);
        let manual = candidates.clone().find(|t| !t.is_generated);
        if let Some(track) = manual.or_else(|| candidates.next()) {
            return Ok(track);
        }
    }

    Err(CaptionError::NoTranscriptFound {
        requested: languages.to_vec(),
        available: tracks.iter().map(|t| t.language_code.clone()).collect(),
    })
}

/// Caption text of one video, joined and capped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    text: String,
    truncated: bool,
}

impl Transcript {
    /// Join segment texts with single spaces and cap the result at
    /// `max_chars` characters, appending [`TRUNCATION_MARKER`] when cut.
    pub fn from_segments(segments: &[CaptionSegment], max_chars: usize) -> Self {
        let full = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        match full.char_indices().nth(max_chars) {
            Some((cut, _)) => Self {
                text: format!("{}{}", &full[..cut], TRUNCATION_MARKER),
                truncated: true,
            },
            None => Self {
                text: full,
                truncated: false,
            },
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Length in characters, marker included
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl From<String> for Transcript {
    fn from(text: String) -> Self {
        Self {
            text,
            truncated: false,
        }
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
