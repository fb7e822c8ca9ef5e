use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    contract::{Contract, FieldType, Schema},
    flow::{invoke, FailureCause, Flow, FlowError},
    prompts, youtube, Studio,
};

/// Longest transcript sent to the model, in characters.
pub const MAX_TRANSCRIPT_CHARS: usize = 30_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummaryInput {
    #[serde(default)]
    pub title: Option<String>,
    pub transcript: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub summary: String,
    pub key_moments: Vec<String>,
    pub vocabulary: Vec<VocabularyEntry>,
}

impl Schema for VideoSummaryInput {
    fn contract() -> Contract {
        Contract::new("VideoSummaryInput")
            .optional("title", FieldType::string())
            .required("transcript", FieldType::text_up_to(MAX_TRANSCRIPT_CHARS))
    }
}

impl Schema for VocabularyEntry {
    fn contract() -> Contract {
        Contract::new("VocabularyEntry")
            .required("term", FieldType::text())
            .required("definition", FieldType::text())
    }
}

impl Schema for VideoSummary {
    fn contract() -> Contract {
        Contract::new("VideoSummary")
            .required("summary", FieldType::text())
            .required(
                "keyMoments",
                FieldType::list_between(FieldType::text(), 1, 10),
            )
            .required(
                "vocabulary",
                FieldType::list(FieldType::object::<VocabularyEntry>()),
            )
    }
}

pub struct SummarizeVideo;

impl Flow for SummarizeVideo {
    const NAME: &'static str = "summarize_video";
    const TEMPLATE: &'static str = prompts::SUMMARIZE_VIDEO;
    type Input = VideoSummaryInput;
    type Output = VideoSummary;
}

pub async fn summarize_video(
    studio: &Studio,
    input: &VideoSummaryInput,
) -> Result<VideoSummary, FlowError> {
    invoke::<SummarizeVideo>(studio, input).await
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((at, _)) => &text[..at],
        None => text,
    }
}

/// Fetches the captions of a YouTube video and summarizes them.
pub async fn summarize_youtube(studio: &Studio, url: &str) -> Result<VideoSummary, FlowError> {
    let transcript = youtube::fetch_transcript(studio.http(), url)
        .await
        .map_err(|e| FlowError::new("summarize_youtube", FailureCause::Transcript(e)))?;

    let text = transcript.plain_text();
    let kept = truncate_chars(&text, MAX_TRANSCRIPT_CHARS);
    if kept.len() < text.len() {
        info!(
            video_id = transcript.video_id.as_str(),
            chars = text.chars().count(),
            "transcript truncated"
        );
    }

    let input = VideoSummaryInput {
        title: None,
        transcript: kept.to_string(),
    };
    summarize_video(studio, &input).await
}
