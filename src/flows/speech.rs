use serde::{Deserialize, Serialize};

use crate::{
    audio,
    config::AppConfig,
    contract::{Contract, FieldType, Schema},
    flow::{invoke_media, FailureCause, FlowError, MediaFlow},
    prompts,
    provider::OutputMode,
    Studio,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechInput {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechOutput {
    pub audio_data_uri: String,
}

impl Schema for SpeechInput {
    fn contract() -> Contract {
        Contract::new("SpeechInput")
            .required("text", FieldType::text_up_to(5_000))
            .optional("voice", FieldType::text())
            .describe("prebuilt voice name")
    }
}

pub struct TextToSpeech;

impl MediaFlow for TextToSpeech {
    const NAME: &'static str = "text_to_speech";
    const TEMPLATE: &'static str = prompts::SPEECH;
    type Input = SpeechInput;

    fn model(config: &AppConfig) -> String {
        config.tts_model.clone()
    }

    fn output_mode(input: &SpeechInput, config: &AppConfig) -> OutputMode {
        OutputMode::Speech {
            voice: input
                .voice
                .clone()
                .unwrap_or_else(|| config.default_voice.clone()),
        }
    }
}

/// Reads text aloud. Unlike image and video this is a hard failure: there
/// is nothing useful to show in place of missing audio.
pub async fn text_to_speech(studio: &Studio, input: &SpeechInput) -> Result<SpeechOutput, FlowError> {
    let media = invoke_media::<TextToSpeech>(studio, input).await?;
    let wav = audio::playable_audio(media)
        .map_err(|e| FlowError::new(TextToSpeech::NAME, FailureCause::MediaConversion(e)))?;
    Ok(SpeechOutput {
        audio_data_uri: wav.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        flows::testing::studio,
        provider::{ModelResponse, ScriptedClient},
        DataUri,
    };

    #[tokio::test]
    async fn pcm_is_wrapped_as_wav() {
        let pcm = DataUri::new("audio/L16;codec=pcm;rate=24000", vec![0, 0, 1, 0]);
        let (studio, client) = studio(ScriptedClient::new().respond(ModelResponse::media(pcm)));
        let input = SpeechInput {
            text: "Photosynthesis turns light into sugar.".into(),
            voice: None,
        };

        let out = text_to_speech(&studio, &input).await.unwrap();
        let wav = DataUri::parse(&out.audio_data_uri).unwrap();
        assert_eq!(wav.mime_type(), "audio/wav");
        assert_eq!(wav.data().len(), 48);
        assert_eq!(&wav.data()[0..4], b"RIFF");

        let request = &client.requests()[0];
        assert_eq!(
            request.output,
            OutputMode::Speech {
                voice: AppConfig::default().default_voice
            }
        );
        assert!(request.prompt.ends_with("Photosynthesis turns light into sugar."));
    }

    #[tokio::test]
    async fn explicit_voice_wins() {
        let mp3 = DataUri::new("audio/mpeg", vec![1, 2, 3]);
        let (studio, client) = studio(ScriptedClient::new().respond(ModelResponse::media(mp3)));
        let input = SpeechInput {
            text: "Hello".into(),
            voice: Some("Kore".into()),
        };
        let out = text_to_speech(&studio, &input).await.unwrap();
        assert!(out.audio_data_uri.starts_with("data:audio/mpeg;base64,"));
        assert_eq!(
            client.requests()[0].output,
            OutputMode::Speech {
                voice: "Kore".into()
            }
        );
    }

    #[tokio::test]
    async fn missing_audio_is_a_hard_failure() {
        let (studio, _) = studio(ScriptedClient::new().respond_empty());
        let input = SpeechInput {
            text: "Hello".into(),
            voice: None,
        };
        let err = text_to_speech(&studio, &input).await.unwrap_err();
        assert_eq!(err.flow, "text_to_speech");
        assert!(matches!(err.cause, FailureCause::EmptyMedia));
    }
}
