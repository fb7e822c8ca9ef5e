use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    GenerationRequest, ModelClient, ModelResponse, OperationHandle, OperationStatus, OutputMode,
    ProviderError,
};
use crate::data_uri::DataUri;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Generative Language REST client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_json(&self, url: String, body: &Value) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    async fn download(&self, uri: &str) -> Result<DataUri, ProviderError> {
        let response = self
            .http
            .get(uri)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = check_status(response).await?;
        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("video/mp4")
            .to_string();
        let bytes = response.bytes().await?;
        Ok(DataUri::new(mime, bytes.to_vec()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = body.as_str(), "provider request failed");
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn generate_content_body(request: &GenerationRequest) -> Result<Value, ProviderError> {
    let mut parts = vec![json!({ "text": request.prompt })];
    for attachment in &request.attachments {
        parts.push(json!({
            "inlineData": {
                "mimeType": attachment.mime_type(),
                "data": attachment.to_base64(),
            }
        }));
    }

    let generation_config = match &request.output {
        OutputMode::Json { schema } => json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        }),
        OutputMode::Image => json!({ "responseModalities": ["TEXT", "IMAGE"] }),
        OutputMode::Speech { voice } => json!({
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
            },
        }),
        OutputMode::Video { .. } => return Err(ProviderError::Unsupported("video")),
    };

    Ok(json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": generation_config,
    }))
}

pub(crate) fn video_body(request: &GenerationRequest) -> Result<Value, ProviderError> {
    let OutputMode::Video {
        aspect_ratio,
        duration_secs,
    } = &request.output
    else {
        return Err(ProviderError::Unsupported("non-video"));
    };

    let mut instance = json!({ "prompt": request.prompt });
    if let Some(image) = request.attachments.first() {
        instance["image"] = json!({
            "bytesBase64Encoded": image.to_base64(),
            "mimeType": image.mime_type(),
        });
    }

    Ok(json!({
        "instances": [instance],
        "parameters": {
            "aspectRatio": aspect_ratio,
            "durationSeconds": duration_secs,
            "sampleCount": 1,
        },
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    pub(crate) fn into_model_response(self) -> Result<ModelResponse, ProviderError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::Blocked(reason));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(ModelResponse::default());
        };
        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ProviderError::Blocked("SAFETY".into()));
        }

        let mut text = String::new();
        let mut media = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(fragment) = part.text {
                text.push_str(&fragment);
            }
            if let Some(inline) = part.inline_data {
                let uri = DataUri::from_base64(inline.mime_type, &inline.data)
                    .map_err(|err| ProviderError::Malformed(err.to_string()))?;
                media.push(uri);
            }
        }

        Ok(ModelResponse {
            text: (!text.is_empty()).then_some(text),
            media,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OperationEnvelope {
    name: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationFailure>,
    #[serde(default)]
    response: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OperationFailure {
    #[serde(default)]
    message: String,
}

/// Video uris listed under `response.generateVideoResponse.generatedSamples[*].video.uri`.
fn sample_uris(response: &Value) -> Vec<String> {
    response
        .pointer("/generateVideoResponse/generatedSamples")
        .and_then(Value::as_array)
        .map(|samples| {
            samples
                .iter()
                .filter_map(|s| s.pointer("/video/uri").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<ModelResponse, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let body = generate_content_body(&request)?;
        debug!(flow = request.flow, model = request.model.as_str(), "generateContent");

        let response = self.post_json(url, &body).await?;
        let parsed: GenerateContentResponse = response.json().await?;
        parsed.into_model_response()
    }

    async fn start_operation(
        &self,
        request: GenerationRequest,
    ) -> Result<OperationHandle, ProviderError> {
        let url = format!("{}/models/{}:predictLongRunning", self.base_url, request.model);
        let body = video_body(&request)?;
        debug!(flow = request.flow, model = request.model.as_str(), "predictLongRunning");

        let response = self.post_json(url, &body).await?;
        let envelope: OperationEnvelope = response.json().await?;
        let name = envelope
            .name
            .ok_or_else(|| ProviderError::Malformed("operation without a name".into()))?;
        Ok(OperationHandle { name })
    }

    async fn check_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, ProviderError> {
        let url = format!("{}/{}", self.base_url, handle.name);
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let envelope: OperationEnvelope = check_status(response).await?.json().await?;

        if let Some(failure) = envelope.error {
            return Ok(OperationStatus::Failed(failure.message));
        }
        if !envelope.done {
            return Ok(OperationStatus::Pending);
        }

        let uris = envelope.response.as_ref().map(sample_uris).unwrap_or_default();
        let mut media = Vec::with_capacity(uris.len());
        for uri in uris {
            media.push(self.download(&uri).await?);
        }
        Ok(OperationStatus::Done(media))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(output: OutputMode) -> GenerationRequest {
        GenerationRequest {
            flow: "test",
            model: "gemini-test".into(),
            prompt: "Explain photosynthesis".into(),
            attachments: vec![DataUri::new("image/png", vec![1, 2, 3])],
            output,
        }
    }

    #[test]
    fn json_body_carries_schema_and_inline_media() {
        let schema = json!({ "type": "OBJECT" });
        let body = generate_content_body(&request(OutputMode::Json {
            schema: schema.clone(),
        }))
        .unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Explain photosynthesis");
        assert_eq!(
            body["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "AQID");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"], schema);
    }

    #[test]
    fn speech_body_selects_voice() {
        let body = generate_content_body(&request(OutputMode::Speech {
            voice: "Algenib".into(),
        }))
        .unwrap();
        assert_eq!(body["generationConfig"]["responseModalities"], json!(["AUDIO"]));
        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Algenib"
        );
    }

    #[test]
    fn video_requests_use_long_running_body() {
        let video = request(OutputMode::Video {
            aspect_ratio: "16:9".into(),
            duration_secs: 8,
        });
        assert!(matches!(
            generate_content_body(&video),
            Err(ProviderError::Unsupported("video"))
        ));
        let body = video_body(&video).unwrap();
        assert_eq!(body["instances"][0]["prompt"], "Explain photosynthesis");
        assert_eq!(body["instances"][0]["image"]["bytesBase64Encoded"], "AQID");
        assert_eq!(body["parameters"]["durationSeconds"], 8);
    }

    #[test]
    fn parses_text_and_inline_media_parts() {
        let raw = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "{\"a\":" },
                    { "text": "1}" },
                    { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
                ]},
                "finishReason": "STOP"
            }]
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let response = parsed.into_model_response().unwrap();
        assert_eq!(response.text.as_deref(), Some("{\"a\":1}"));
        assert_eq!(response.media[0].data(), &[1, 2, 3]);
    }

    #[test]
    fn empty_candidates_yield_empty_response() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert_eq!(parsed.into_model_response().unwrap(), ModelResponse::default());
    }

    #[test]
    fn blocked_prompts_are_errors() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "OTHER" } }))
                .unwrap();
        assert!(matches!(
            parsed.into_model_response(),
            Err(ProviderError::Blocked(reason)) if reason == "OTHER"
        ));
    }

    #[test]
    fn extracts_video_sample_uris() {
        let response = json!({
            "generateVideoResponse": {
                "generatedSamples": [
                    { "video": { "uri": "https://example.com/v1" } },
                    { "video": {} }
                ]
            }
        });
        assert_eq!(sample_uris(&response), vec!["https://example.com/v1".to_string()]);
        assert!(sample_uris(&json!({})).is_empty());
    }
}
