//! Boundary to the hosted generative models.
//!
//! Flows never talk HTTP themselves; they hand a [`GenerationRequest`] to a
//! [`ModelClient`] and get back either text, inline media, or a handle to a
//! long-running operation.

pub mod gemini;
pub mod scripted;
mod unavailable;

pub use gemini::GeminiClient;
pub use scripted::ScriptedClient;
pub use unavailable::UnavailableClient;

use serde_json::Value;

use crate::data_uri::DataUri;

#[derive(Debug, Clone, PartialEq)]
pub enum OutputMode {
    /// Structured JSON constrained by a response schema.
    Json { schema: Value },
    Image,
    Speech { voice: String },
    Video {
        aspect_ratio: String,
        duration_secs: u8,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub flow: &'static str,
    pub model: String,
    pub prompt: String,
    pub attachments: Vec<DataUri>,
    pub output: OutputMode,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub media: Vec<DataUri>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            media: Vec::new(),
        }
    }

    pub fn json(value: &Value) -> Self {
        Self::text(value.to_string())
    }

    pub fn media(media: DataUri) -> Self {
        Self {
            text: None,
            media: vec![media],
        }
    }

    /// First non-empty media part, if any.
    pub fn first_media(self) -> Option<DataUri> {
        self.media.into_iter().find(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Pending,
    Done(Vec<DataUri>),
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no model provider is configured")]
    Unavailable,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider blocked the request: {0}")]
    Blocked(String),
    #[error("unexpected provider response: {0}")]
    Malformed(String),
    #[error("{0} output is not supported by this call")]
    Unsupported(&'static str),
    #[error("{0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// False when every call is known to fail (no credentials configured).
    fn is_available(&self) -> bool {
        true
    }

    /// Single request/response generation.
    async fn generate(&self, request: GenerationRequest) -> Result<ModelResponse, ProviderError>;

    /// Starts a long-running generation (video) and returns its handle.
    async fn start_operation(
        &self,
        request: GenerationRequest,
    ) -> Result<OperationHandle, ProviderError>;

    /// Reports the current state of a long-running generation.
    async fn check_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, ProviderError>;
}
