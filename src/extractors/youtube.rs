use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;

use super::{CaptionError, CaptionSegment, CaptionTrack, TranscriptSource, VideoId};

const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";
const CONSENT_FORM_MARKER: &str = "action=\"https://consent.youtube.com/s\"";
const RECAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";

/// YouTube caption source backed by the InnerTube player API
pub struct YoutubeTranscriptSource {
    client: Client,
}

impl YoutubeTranscriptSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch the watch page, accepting the consent wall once if YouTube shows it
    async fn fetch_watch_page(&self, video_id: &VideoId) -> Result<String, CaptionError> {
        let url = video_id.watch_url();
        let html = self.get_text(&url, None).await?;

        if !html.contains(CONSENT_FORM_MARKER) {
            return Ok(html);
        }

        tracing::debug!("Consent page shown for {}, retrying with consent cookie", video_id);
        let consent_value =
            extract_quoted_after(&html, "name=\"v\" value=\"").ok_or(CaptionError::ConsentRequired)?;
        let cookie = format!("CONSENT=YES+{}", consent_value);

        let html = self.get_text(&url, Some(&cookie)).await?;
        if html.contains(CONSENT_FORM_MARKER) {
            return Err(CaptionError::ConsentRequired);
        }
        Ok(html)
    }

    async fn get_text(&self, url: &str, cookie: Option<&str>) -> Result<String, CaptionError> {
        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, "en-US");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(CaptionError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    /// Query the InnerTube player endpoint for the video's metadata
    async fn fetch_player_response(
        &self,
        video_id: &VideoId,
        api_key: &str,
    ) -> Result<String, CaptionError> {
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id.as_str(),
        });

        let response = self
            .client
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key)])
            .header(header::ACCEPT_LANGUAGE, "en-US")
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "InnerTube player request failed"))?;

        if !response.status().is_success() {
            return Err(CaptionError::Status {
                status: response.status().as_u16(),
                url: INNERTUBE_PLAYER_URL.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    async fn list_transcripts(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, CaptionError> {
        tracing::debug!("Listing caption tracks for video: {}", video_id);

        let html = self.fetch_watch_page(video_id).await?;
        let api_key = match extract_quoted_after(&html, "\"INNERTUBE_API_KEY\":") {
            Some(key) => key,
            None if html.contains(RECAPTCHA_MARKER) => return Err(CaptionError::RequestBlocked),
            None => {
                return Err(CaptionError::Unparsable(
                    "INNERTUBE_API_KEY not found on watch page".into(),
                ))
            }
        };

        let player = self.fetch_player_response(video_id, &api_key).await?;
        let tracks = parse_caption_tracks(video_id, &player)?;

        tracing::debug!(
            "Found {} caption tracks: {:?}",
            tracks.len(),
            tracks.iter().map(|t| t.language_code.as_str()).collect::<Vec<_>>()
        );
        Ok(tracks)
    }

    async fn fetch_segments(&self, track: &CaptionTrack) -> Result<Vec<CaptionSegment>, CaptionError> {
        tracing::debug!(
            "Fetching {} captions ({})",
            track.language_code,
            if track.is_generated { "generated" } else { "manual" }
        );

        let body = self.get_text(&json3_url(&track.base_url), None).await?;
        parse_json3_segments(&body)
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}

impl Default for YoutubeTranscriptSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Return the double-quoted value that follows `prefix`, skipping whitespace
fn extract_quoted_after(haystack: &str, prefix: &str) -> Option<String> {
    let start = haystack.find(prefix)? + prefix.len();
    let rest = haystack[start..].trim_start();
    let rest = rest.strip_prefix('"').unwrap_or(rest);
    let end = rest.find('"')?;
    let value = &rest[..end];
    (!value.is_empty()).then(|| value.to_string())
}

/// Ask the timedtext endpoint for JSON instead of the default XML
fn json3_url(base_url: &str) -> String {
    format!("{}&fmt=json3", base_url.replace("&fmt=srv3", ""))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    caption_tracks: Option<Vec<RawCaptionTrack>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: f64,
    #[serde(default)]
    d_duration_ms: f64,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    utf8: Option<String>,
}

/// Turn an InnerTube player response into the list of caption tracks
fn parse_caption_tracks(video_id: &VideoId, body: &str) -> Result<Vec<CaptionTrack>, CaptionError> {
    let player: PlayerResponse =
        serde_json::from_str(body).map_err(|e| CaptionError::Unparsable(e.to_string()))?;

    if let Some(status) = &player.playability_status {
        if status.status != "OK" {
            let reason = status.reason.clone().unwrap_or_default();
            return Err(match status.status.as_str() {
                "ERROR" if reason.contains("unavailable") => {
                    CaptionError::VideoUnavailable(video_id.to_string())
                }
                "LOGIN_REQUIRED" if reason.contains("not a bot") => CaptionError::RequestBlocked,
                _ => CaptionError::VideoUnplayable(if reason.is_empty() {
                    status.status.clone()
                } else {
                    reason
                }),
            });
        }
    }

    let raw_tracks = player
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .ok_or_else(|| CaptionError::TranscriptsDisabled(video_id.to_string()))?;

    Ok(raw_tracks
        .into_iter()
        .map(|raw| {
            let language = raw
                .name
                .and_then(|n| {
                    n.simple_text
                        .or_else(|| n.runs.and_then(|runs| runs.into_iter().next().map(|r| r.text)))
                })
                .unwrap_or_else(|| raw.language_code.clone());

            CaptionTrack {
                is_generated: raw.kind.as_deref() == Some("asr"),
                language_code: raw.language_code,
                language,
                base_url: raw.base_url,
            }
        })
        .collect())
}

/// Parse the timedtext `json3` format into ordered segments
fn parse_json3_segments(body: &str) -> Result<Vec<CaptionSegment>, CaptionError> {
    let transcript: Json3Transcript =
        serde_json::from_str(body).map_err(|e| CaptionError::Unparsable(e.to_string()))?;

    Ok(transcript
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event
                .segs?
                .into_iter()
                .filter_map(|seg| seg.utf8)
                .collect();
            if text.trim().is_empty() {
                return None;
            }
            Some(CaptionSegment {
                text,
                start: event.t_start_ms / 1000.0,
                duration: event.d_duration_ms / 1000.0,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::extract_video_id;

    fn video() -> VideoId {
        extract_video_id("https://youtu.be/abc123").unwrap()
    }

    #[test]
    fn test_extract_innertube_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSyTest_key-1","OTHER":"x"})</script>"#;
        assert_eq!(
            extract_quoted_after(html, "\"INNERTUBE_API_KEY\":"),
            Some("AIzaSyTest_key-1".to_string())
        );
        assert_eq!(extract_quoted_after("<html></html>", "\"INNERTUBE_API_KEY\":"), None);
    }

    #[test]
    fn test_json3_url_replaces_format() {
        assert_eq!(
            json3_url("https://www.youtube.com/api/timedtext?v=abc&lang=en&fmt=srv3"),
            "https://www.youtube.com/api/timedtext?v=abc&lang=en&fmt=json3"
        );
    }

    #[test]
    fn test_parse_caption_tracks() {
        let body = r#"{
            "playabilityStatus": {"status": "OK"},
            "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                {"baseUrl": "https://yt/t?lang=en", "languageCode": "en",
                 "name": {"runs": [{"text": "English"}]}},
                {"baseUrl": "https://yt/t?lang=en&kind=asr", "languageCode": "en",
                 "name": {"simpleText": "English (auto-generated)"}, "kind": "asr"}
            ]}}
        }"#;

        let tracks = parse_caption_tracks(&video(), body).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].language, "English");
        assert!(!tracks[0].is_generated);
        assert_eq!(tracks[1].language, "English (auto-generated)");
        assert!(tracks[1].is_generated);
    }

    #[test]
    fn test_parse_caption_tracks_disabled() {
        let body = r#"{"playabilityStatus": {"status": "OK"}}"#;
        assert!(matches!(
            parse_caption_tracks(&video(), body),
            Err(CaptionError::TranscriptsDisabled(id)) if id == "abc123"
        ));
    }

    #[test]
    fn test_parse_caption_tracks_unavailable() {
        let body = r#"{"playabilityStatus": {"status": "ERROR", "reason": "This video is unavailable"}}"#;
        assert!(matches!(
            parse_caption_tracks(&video(), body),
            Err(CaptionError::VideoUnavailable(_))
        ));

        let body = r#"{"playabilityStatus": {"status": "UNPLAYABLE", "reason": "Private video"}}"#;
        assert!(matches!(
            parse_caption_tracks(&video(), body),
            Err(CaptionError::VideoUnplayable(reason)) if reason == "Private video"
        ));
    }

    #[test]
    fn test_parse_json3_segments() {
        let body = r#"{"events": [
            {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "hello"}, {"utf8": " world"}]},
            {"tStartMs": 1500, "dDurationMs": 10, "segs": [{"utf8": "\n"}]},
            {"tStartMs": 1600},
            {"tStartMs": 2000, "dDurationMs": 500, "segs": [{"utf8": "again"}]}
        ]}"#;

        let segments = parse_json3_segments(body).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hello world");
        assert_eq!(segments[0].duration, 1.5);
        assert_eq!(segments[1].text, "again");
        assert_eq!(segments[1].start, 2.0);
    }
}
