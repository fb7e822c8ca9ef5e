use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    api::{
        types::{ApiError, FlowReply, HealthResponse, YoutubeSummaryRequest},
        AppState,
    },
    contract::Schema,
    flow::{Degraded, Generation, Placeholder},
    flows,
};

pub const FLOW_NAMES: &[&str] = &[
    "grade-assignment",
    "sat-question",
    "quiz",
    "flashcards",
    "study-plan",
    "summarize-notes",
    "essay",
    "mindfulness",
    "explain-concept",
    "solve-math",
    "summarize-video",
    "image",
    "speech",
    "video",
    "course",
];

/// Raises the cancel flag when the request future is dropped, so a client
/// that disconnects stops the poll loop.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Decodes a request body and checks it against the input contract, so bad
/// input is rejected before any media flow can degrade it.
fn parse<I: DeserializeOwned + Serialize + Schema>(body: Value) -> Result<I, ApiError> {
    let input: I =
        serde_json::from_value(body).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
    let normalized =
        serde_json::to_value(&input).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
    I::contract()
        .validate(&normalized)
        .map_err(|v| ApiError::InvalidInput(v.to_string()))?;
    Ok(input)
}

fn ready<T: Serialize>(output: T) -> Result<(Value, Option<Degraded>), ApiError> {
    let value = serde_json::to_value(output).map_err(|e| ApiError::Failed {
        flow: "api",
        detail: e.to_string(),
    })?;
    Ok((value, None))
}

fn generated<T: Serialize + Placeholder>(
    generation: Generation<T>,
) -> Result<(Value, Option<Degraded>), ApiError> {
    let degraded = generation.degraded().cloned();
    let (value, _) = ready(generation.into_output())?;
    Ok((value, degraded))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider_available: state.studio.provider_available(),
        flows: FLOW_NAMES.to_vec(),
    })
}

pub async fn run_flow(
    State(state): State<AppState>,
    Path(flow): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<FlowReply>, ApiError> {
    let studio = state.studio.as_ref();

    let (output, degraded) = match flow.as_str() {
        "grade-assignment" => ready(flows::grade_assignment(studio, &parse(body)?).await?)?,
        "sat-question" => ready(flows::generate_sat_question(studio, &parse(body)?).await?)?,
        "quiz" => ready(flows::generate_quiz(studio, &parse(body)?).await?)?,
        "flashcards" => ready(flows::generate_flashcards(studio, &parse(body)?).await?)?,
        "study-plan" => ready(flows::generate_study_plan(studio, &parse(body)?).await?)?,
        "summarize-notes" => ready(flows::summarize_notes(studio, &parse(body)?).await?)?,
        "essay" => ready(flows::generate_essay(studio, &parse(body)?).await?)?,
        "mindfulness" => ready(flows::generate_mindfulness(studio, &parse(body)?).await?)?,
        "explain-concept" => ready(flows::explain_concept(studio, &parse(body)?).await?)?,
        "solve-math" => ready(flows::solve_math(studio, &parse(body)?).await?)?,
        "summarize-video" => ready(flows::summarize_video(studio, &parse(body)?).await?)?,
        "speech" => ready(flows::text_to_speech(studio, &parse(body)?).await?)?,
        "course" => ready(flows::generate_course(studio, &parse(body)?).await?)?,
        "image" => generated(flows::generate_image(studio, &parse(body)?).await)?,
        "video" => {
            let guard = CancelOnDrop(Arc::new(AtomicBool::new(false)));
            generated(flows::generate_video(studio, &parse(body)?, guard.0.clone()).await)?
        }
        _ => return Err(ApiError::UnknownFlow(flow)),
    };

    Ok(Json(FlowReply {
        flow,
        request_id: Uuid::new_v4().to_string(),
        generated_ts: Utc::now().timestamp_millis(),
        output,
        degraded,
    }))
}

pub async fn youtube_summary(
    State(state): State<AppState>,
    Json(req): Json<YoutubeSummaryRequest>,
) -> Result<Json<FlowReply>, ApiError> {
    let summary = flows::summarize_youtube(&state.studio, &req.url).await?;
    let (output, _) = ready(summary)?;
    Ok(Json(FlowReply {
        flow: "youtube-summary".into(),
        request_id: Uuid::new_v4().to_string(),
        generated_ts: Utc::now().timestamp_millis(),
        output,
        degraded: None,
    }))
}
