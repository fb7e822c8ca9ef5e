//! Flow invoker: validate input, render prompt, call the model, validate
//! output. Every public entry point in [`crate::flows`] goes through here.

mod media;

pub use media::{Degraded, Generation, Placeholder};
pub(crate) use media::degrade;

use std::sync::{atomic::AtomicBool, Arc};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    contract::{ContractViolation, Schema},
    data_uri::DataUri,
    operation::{poll_until_done, PollError},
    prompts::{self, TemplateError},
    provider::{GenerationRequest, ModelResponse, OutputMode, ProviderError},
    studio::Studio,
    youtube::TranscriptError,
};

/// A prompt-to-JSON generation with typed input and output contracts.
pub trait Flow {
    const NAME: &'static str;
    const TEMPLATE: &'static str;

    type Input: Schema + Serialize + Sync;
    type Output: Schema + DeserializeOwned;

    fn model(config: &AppConfig) -> String {
        config.text_model.clone()
    }

    /// Media sent alongside the rendered prompt.
    fn attachments(_input: &Self::Input) -> Vec<DataUri> {
        Vec::new()
    }

    /// Extends the serialized input with derived template values.
    fn context(_input: &Self::Input, serialized: Value) -> Value {
        serialized
    }
}

/// A prompt-to-media generation (image, speech, video).
pub trait MediaFlow {
    const NAME: &'static str;
    const TEMPLATE: &'static str;

    type Input: Schema + Serialize + Sync;

    fn model(config: &AppConfig) -> String;

    fn output_mode(input: &Self::Input, config: &AppConfig) -> OutputMode;

    fn attachments(_input: &Self::Input) -> Vec<DataUri> {
        Vec::new()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{flow}: generation failed")]
pub struct FlowError {
    pub flow: &'static str,
    #[source]
    pub cause: FailureCause,
}

#[derive(Debug, thiserror::Error)]
pub enum FailureCause {
    #[error("input rejected: {0}")]
    InvalidInput(ContractViolation),
    #[error("input could not be encoded: {0}")]
    Encode(serde_json::Error),
    #[error("{0}")]
    Template(TemplateError),
    #[error("model call failed: {0}")]
    Provider(ProviderError),
    #[error("model returned no structured output")]
    EmptyOutput,
    #[error("model output is not valid JSON: {0}")]
    MalformedOutput(serde_json::Error),
    #[error("model output rejected: {0}")]
    InvalidOutput(ContractViolation),
    #[error("model returned no media")]
    EmptyMedia,
    #[error("media could not be converted: {0}")]
    MediaConversion(std::io::Error),
    #[error("{0}")]
    Operation(PollError),
    #[error("transcript unavailable: {0}")]
    Transcript(TranscriptError),
}

impl FlowError {
    pub fn new(flow: &'static str, cause: FailureCause) -> Self {
        Self { flow, cause }
    }

    /// True when the caller sent a value that violates the input contract.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.cause, FailureCause::InvalidInput(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.cause,
            FailureCause::Provider(ProviderError::Unavailable)
                | FailureCause::Operation(PollError::Provider(ProviderError::Unavailable))
        )
    }
}

/// Serializes and validates the input, then renders its template.
fn render_prompt<I: Schema + Serialize>(
    flow: &'static str,
    template: &'static str,
    input: &I,
    extend: impl FnOnce(Value) -> Value,
) -> Result<String, FlowError> {
    let fail = |cause| FlowError::new(flow, cause);
    let serialized = serde_json::to_value(input).map_err(|e| fail(FailureCause::Encode(e)))?;
    I::contract()
        .validate(&serialized)
        .map_err(|v| fail(FailureCause::InvalidInput(v)))?;
    prompts::render(template, &extend(serialized)).map_err(|e| fail(FailureCause::Template(e)))
}

/// Pulls the JSON document out of a text response, tolerating markdown fences.
pub(crate) fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Checks a raw model response against the output contract and decodes it.
pub(crate) fn decode_output<O: Schema + DeserializeOwned>(
    flow: &'static str,
    response: ModelResponse,
) -> Result<O, FlowError> {
    let fail = |cause| FlowError::new(flow, cause);
    let text = response
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| fail(FailureCause::EmptyOutput))?;

    let mut value: Value = serde_json::from_str(extract_json(&text))
        .map_err(|e| fail(FailureCause::MalformedOutput(e)))?;
    if value.is_null() {
        return Err(fail(FailureCause::EmptyOutput));
    }
    let contract = O::contract();
    contract
        .validate(&value)
        .map_err(|v| fail(FailureCause::InvalidOutput(v)))?;
    contract.normalize(&mut value);
    serde_json::from_value(value).map_err(|e| fail(FailureCause::MalformedOutput(e)))
}

fn log_outcome<T>(
    flow: &'static str,
    request_id: Uuid,
    model: &str,
    started: Instant,
    result: &Result<T, FlowError>,
) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(_) => info!(
            flow,
            request_id = %request_id,
            model,
            elapsed_ms,
            "flow completed"
        ),
        Err(err) => warn!(
            flow,
            request_id = %request_id,
            model,
            elapsed_ms,
            cause = %err.cause,
            "flow failed"
        ),
    }
}

/// Runs one structured generation. Attempted exactly once; no caching.
pub async fn invoke<F: Flow>(studio: &Studio, input: &F::Input) -> Result<F::Output, FlowError> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    let model = F::model(studio.config());

    let result = async {
        let prompt = render_prompt(F::NAME, F::TEMPLATE, input, |v| F::context(input, v))?;
        let request = GenerationRequest {
            flow: F::NAME,
            model: model.clone(),
            prompt,
            attachments: F::attachments(input),
            output: OutputMode::Json {
                schema: F::Output::contract().response_schema(),
            },
        };
        let response = studio
            .client()
            .generate(request)
            .await
            .map_err(|e| FlowError::new(F::NAME, FailureCause::Provider(e)))?;
        decode_output::<F::Output>(F::NAME, response)
    }
    .await;

    log_outcome(F::NAME, request_id, &model, started, &result);
    result
}

fn media_request<F: MediaFlow>(
    studio: &Studio,
    input: &F::Input,
    model: &str,
) -> Result<GenerationRequest, FlowError> {
    let prompt = render_prompt(F::NAME, F::TEMPLATE, input, |v| v)?;
    Ok(GenerationRequest {
        flow: F::NAME,
        model: model.to_string(),
        prompt,
        attachments: F::attachments(input),
        output: F::output_mode(input, studio.config()),
    })
}

/// Runs one media generation that completes in a single call.
pub async fn invoke_media<F: MediaFlow>(
    studio: &Studio,
    input: &F::Input,
) -> Result<DataUri, FlowError> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    let model = F::model(studio.config());

    let result = async {
        let request = media_request::<F>(studio, input, &model)?;
        let response = studio
            .client()
            .generate(request)
            .await
            .map_err(|e| FlowError::new(F::NAME, FailureCause::Provider(e)))?;
        response
            .first_media()
            .ok_or_else(|| FlowError::new(F::NAME, FailureCause::EmptyMedia))
    }
    .await;

    log_outcome(F::NAME, request_id, &model, started, &result);
    result
}

/// Runs a long-running media generation: submit, then poll under the
/// configured policy until it finishes, fails, times out or is cancelled.
pub async fn invoke_operation<F: MediaFlow>(
    studio: &Studio,
    input: &F::Input,
    cancel: Arc<AtomicBool>,
) -> Result<DataUri, FlowError> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    let model = F::model(studio.config());

    let result = async {
        let request = media_request::<F>(studio, input, &model)?;
        let handle = studio
            .client()
            .start_operation(request)
            .await
            .map_err(|e| FlowError::new(F::NAME, FailureCause::Provider(e)))?;
        info!(
            flow = F::NAME,
            request_id = %request_id,
            operation = handle.name.as_str(),
            "operation submitted"
        );
        let media = poll_until_done(studio.client(), &handle, studio.config().poll, cancel)
            .await
            .map_err(|e| FlowError::new(F::NAME, FailureCause::Operation(e)))?;
        media
            .into_iter()
            .find(|m| !m.is_empty())
            .ok_or_else(|| FlowError::new(F::NAME, FailureCause::EmptyMedia))
    }
    .await;

    log_outcome(F::NAME, request_id, &model, started, &result);
    result
}
