//! Caption transcripts for public YouTube videos.
//!
//! The watch page embeds its caption track list as JSON inside a script
//! tag; each track points at a timed-text XML document. No API key is
//! needed, but the page layout is not a stable interface, so every step
//! reports a typed [`TranscriptError`] instead of guessing.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::{debug, info};

const WATCH_URL: &str = "https://www.youtube.com/watch";

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("video id regex")
});
static BARE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("bare id regex"));
static CAPTION_TRACKS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""captionTracks"\s*:\s*\["#).expect("caption tracks regex"));
static TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<text\s+start="([\d.]+)"(?:\s+dur="([\d.]+)")?[^>]*>(.*?)</text>"#)
        .expect("timed text regex")
});
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("entity regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("space regex"));

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("not a YouTube video url: {0}")]
    InvalidUrl(String),
    #[error("video {video_id} has no captions")]
    NoCaptions { video_id: String },
    #[error("transcript request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transcript request returned HTTP {status}")]
    Status { status: u16 },
    #[error("captions for video {video_id} are empty")]
    Empty { video_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated captions.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    fn is_english(&self) -> bool {
        self.language_code == "en" || self.language_code.starts_with("en-")
    }

    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start_secs: f64,
    pub duration_secs: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub video_id: String,
    pub language: String,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Accepts watch, short, embed, live and `youtu.be` links, or a bare id.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    if BARE_ID_RE.is_match(url) {
        return Some(url.to_string());
    }
    VIDEO_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Reads the caption track list embedded in a watch page.
pub fn parse_caption_tracks(html: &str) -> Vec<CaptionTrack> {
    let Some(found) = CAPTION_TRACKS_RE.find(html) else {
        return Vec::new();
    };
    // Resume at the opening bracket and let the JSON parser find its end.
    let array = &html[found.end() - 1..];
    serde_json::Deserializer::from_str(array)
        .into_iter::<Vec<CaptionTrack>>()
        .next()
        .and_then(Result::ok)
        .unwrap_or_default()
}

/// Manual English captions, then generated English, then whatever is first.
pub fn pick_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.is_english() && !t.is_generated())
        .or_else(|| tracks.iter().find(|t| t.is_english()))
        .or_else(|| tracks.first())
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Parses a timed-text document into segments in document order. Caption
/// text arrives entity-encoded twice (`&amp;#39;`), hence the double decode.
pub fn parse_transcript_xml(xml: &str) -> Vec<TranscriptSegment> {
    TEXT_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let decoded = decode_entities(&decode_entities(&caps[3]));
            let stripped = TAG_RE.replace_all(&decoded, " ");
            let text = SPACE_RE.replace_all(stripped.trim(), " ").into_owned();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                start_secs: caps[1].parse().unwrap_or(0.0),
                duration_secs: caps
                    .get(2)
                    .and_then(|d| d.as_str().parse().ok())
                    .unwrap_or(0.0),
                text,
            })
        })
        .collect()
}

async fn get_text(http: &reqwest::Client, url: &str) -> Result<String, TranscriptError> {
    let response = http
        .get(url)
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(TranscriptError::Status {
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

pub async fn fetch_transcript(
    http: &reqwest::Client,
    url: &str,
) -> Result<Transcript, TranscriptError> {
    let video_id =
        extract_video_id(url).ok_or_else(|| TranscriptError::InvalidUrl(url.to_string()))?;

    let html = get_text(http, &format!("{WATCH_URL}?v={video_id}")).await?;
    let tracks = parse_caption_tracks(&html);
    debug!(video_id = video_id.as_str(), tracks = tracks.len(), "caption tracks found");
    let track = pick_track(&tracks).ok_or_else(|| TranscriptError::NoCaptions {
        video_id: video_id.clone(),
    })?;

    let xml = get_text(http, &track.base_url).await?;
    let segments = parse_transcript_xml(&xml);
    if segments.is_empty() {
        return Err(TranscriptError::Empty { video_id });
    }

    info!(
        video_id = video_id.as_str(),
        language = track.language_code.as_str(),
        segments = segments.len(),
        "transcript fetched"
    );
    Ok(Transcript {
        video_id,
        language: track.language_code.clone(),
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ids_from_common_urls() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id);
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42"),
            id
        );
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc"), id);
        assert_eq!(extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("  dQw4w9WgXcQ "), id);
        assert_eq!(extract_video_id("https://vimeo.com/12345678901"), None);
        assert_eq!(extract_video_id("too-short"), None);
    }

    const WATCH_PAGE: &str = r#"<script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=x&lang=de","languageCode":"de","name":{"simpleText":"German [x]"}},{"baseUrl":"https://www.youtube.com/api/timedtext?v=x&lang=en&kind=asr","languageCode":"en","kind":"asr"},{"baseUrl":"https://www.youtube.com/api/timedtext?v=x&lang=en-GB","languageCode":"en-GB"}],"audioTracks":[]}}};</script>"#;

    #[test]
    fn reads_caption_tracks_from_watch_page() {
        let tracks = parse_caption_tracks(WATCH_PAGE);
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].language_code, "de");
        assert_eq!(
            tracks[1].base_url,
            "https://www.youtube.com/api/timedtext?v=x&lang=en&kind=asr"
        );
        assert_eq!(pick_track(&tracks).unwrap().language_code, "en-GB");
    }

    #[test]
    fn falls_back_to_generated_then_first_track() {
        let mut tracks = parse_caption_tracks(WATCH_PAGE);
        tracks.pop();
        assert!(pick_track(&tracks).unwrap().is_generated());
        tracks.pop();
        assert_eq!(pick_track(&tracks).unwrap().language_code, "de");
        assert!(pick_track(&[]).is_none());
    }

    #[test]
    fn page_without_captions_has_no_tracks() {
        assert!(parse_caption_tracks("<html>no captions here</html>").is_empty());
        assert!(parse_caption_tracks(r#""captionTracks":[{"broken"#).is_empty());
    }

    #[test]
    fn parses_timed_text_in_order() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
            <text start="0.5" dur="2.1">Today we&amp;#39;ll look at &lt;b&gt;cells&lt;/b&gt;</text>
            <text start="2.6" dur="1.9">  </text>
            <text start="4.5">Tom &amp;amp; Jerry
            say &#x48;i</text>
        </transcript>"#;
        let segments = parse_transcript_xml(xml);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Today we'll look at cells");
        assert_eq!(segments[0].start_secs, 0.5);
        assert_eq!(segments[0].duration_secs, 2.1);
        assert_eq!(segments[1].text, "Tom & Jerry say Hi");
        assert_eq!(segments[1].duration_secs, 0.0);

        let transcript = Transcript {
            video_id: "dQw4w9WgXcQ".into(),
            language: "en".into(),
            segments,
        };
        assert_eq!(transcript.plain_text(), "Today we'll look at cells Tom & Jerry say Hi");
    }
}
