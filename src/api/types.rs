use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    flow::{Degraded, FailureCause, FlowError},
    youtube::TranscriptError,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReply {
    pub flow: String,
    pub request_id: String,
    /// Unix milliseconds.
    pub generated_ts: i64,
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<Degraded>,
}

#[derive(Debug, Deserialize)]
pub struct YoutubeSummaryRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider_available: bool,
    pub flows: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unknown flow: {0}")]
    UnknownFlow(String),
    #[error("invalid input")]
    InvalidInput(String),
    #[error("model provider unavailable")]
    Unavailable,
    #[error("{flow}: generation failed")]
    Failed { flow: &'static str, detail: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownFlow(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Failed { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        if err.is_unavailable() {
            return ApiError::Unavailable;
        }
        match err.cause {
            FailureCause::InvalidInput(violation) => ApiError::InvalidInput(violation.to_string()),
            FailureCause::Transcript(TranscriptError::InvalidUrl(url)) => {
                ApiError::InvalidInput(format!("not a YouTube video url: {url}"))
            }
            cause => ApiError::Failed {
                flow: err.flow,
                detail: cause.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let detail = match &self {
            ApiError::InvalidInput(detail) | ApiError::Failed { detail, .. } => {
                Some(detail.clone())
            }
            ApiError::UnknownFlow(_) | ApiError::Unavailable => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            detail,
        };
        (self.status(), Json(body)).into_response()
    }
}
