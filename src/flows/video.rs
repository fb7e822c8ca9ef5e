use std::sync::{atomic::AtomicBool, Arc};

use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    contract::{Contract, FieldType, Schema},
    flow::{degrade, invoke_operation, Generation, MediaFlow, Placeholder},
    prompts,
    provider::OutputMode,
    Studio,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInput {
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default = "default_duration")]
    pub duration_secs: u8,
}

fn default_duration() -> u8 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOutput {
    pub video_data_uri: String,
}

impl Schema for VideoInput {
    fn contract() -> Contract {
        Contract::new("VideoInput")
            .required("prompt", FieldType::text_up_to(2_000))
            .required("aspectRatio", FieldType::one_of(&["16:9", "9:16"]))
            .required("durationSecs", FieldType::integer(5, 8))
    }
}

impl Placeholder for VideoOutput {
    fn placeholder() -> Self {
        Self {
            video_data_uri: String::new(),
        }
    }
}

pub struct GenerateVideo;

impl MediaFlow for GenerateVideo {
    const NAME: &'static str = "generate_video";
    const TEMPLATE: &'static str = prompts::VIDEO;
    type Input = VideoInput;

    fn model(config: &AppConfig) -> String {
        config.video_model.clone()
    }

    fn output_mode(input: &VideoInput, _config: &AppConfig) -> OutputMode {
        OutputMode::Video {
            aspect_ratio: input.aspect_ratio.as_str().to_string(),
            duration_secs: input.duration_secs,
        }
    }
}

/// Submits a video generation and polls it to completion. Any failure,
/// including an exhausted or cancelled poll, degrades to an empty clip.
pub async fn generate_video(
    studio: &Studio,
    input: &VideoInput,
    cancel: Arc<AtomicBool>,
) -> Generation<VideoOutput> {
    degrade(invoke_operation::<GenerateVideo>(studio, input, cancel).await).map(|media| {
        VideoOutput {
            video_data_uri: media.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::{
        operation::PollPolicy,
        provider::{OperationStatus, ScriptedClient},
        DataUri,
    };

    fn studio(client: ScriptedClient) -> (Studio, Arc<ScriptedClient>) {
        let client = Arc::new(client);
        let config = AppConfig {
            poll: PollPolicy {
                interval: Duration::from_millis(1),
                max_attempts: 3,
                deadline: None,
            },
            ..AppConfig::default()
        };
        (Studio::new(config, client.clone()), client)
    }

    fn input() -> VideoInput {
        VideoInput {
            prompt: "a volcano erupting, cross-section view".into(),
            aspect_ratio: AspectRatio::Portrait,
            duration_secs: 6,
        }
    }

    #[tokio::test]
    async fn polls_until_the_clip_is_ready() {
        let clip = DataUri::new("video/mp4", vec![0, 0, 0, 24]);
        let (studio, client) = studio(
            ScriptedClient::new()
                .poll(OperationStatus::Pending)
                .poll(OperationStatus::Done(vec![clip.clone()])),
        );

        let out = generate_video(&studio, &input(), Arc::new(AtomicBool::new(false))).await;
        assert_eq!(out.into_output().video_data_uri, clip.to_string());
        assert_eq!(client.polls_seen(), 2);

        let request = &client.requests()[0];
        assert_eq!(request.model, AppConfig::default().video_model);
        assert_eq!(
            request.output,
            OutputMode::Video {
                aspect_ratio: "9:16".into(),
                duration_secs: 6
            }
        );
    }

    #[tokio::test]
    async fn exhausted_poll_degrades() {
        let (studio, client) = studio(ScriptedClient::new());
        let out = generate_video(&studio, &input(), Arc::new(AtomicBool::new(false))).await;
        assert!(out.is_degraded());
        assert_eq!(client.polls_seen(), 3);
        assert_eq!(out.into_output().video_data_uri, "");
    }

    #[tokio::test]
    async fn cancelled_before_first_poll() {
        let (studio, client) = studio(ScriptedClient::new());
        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::SeqCst);
        let out = generate_video(&studio, &input(), cancel).await;
        assert!(out.degraded().unwrap().reason.contains("cancelled"));
        assert_eq!(client.polls_seen(), 0);
    }

    #[tokio::test]
    async fn duration_outside_range_degrades_without_submitting() {
        let (studio, client) = studio(ScriptedClient::new());
        let mut input = input();
        input.duration_secs = 12;
        let out = generate_video(&studio, &input, Arc::new(AtomicBool::new(false))).await;
        assert!(out.degraded().unwrap().reason.starts_with("input rejected"));
        assert!(client.requests().is_empty());
    }
}
