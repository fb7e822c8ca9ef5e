use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::Studio;

pub mod handlers;
pub mod types;

use handlers::{health, run_flow, youtube_summary};

#[derive(Clone)]
pub struct AppState {
    pub studio: Arc<Studio>,
}

impl AppState {
    pub fn new(studio: Studio) -> Self {
        Self {
            studio: Arc::new(studio),
        }
    }
}

/// Public HTTP surface. Flows are addressed by kebab-case name.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // POST /api/flows/{flow}
        .route("/api/flows/{flow}", post(run_flow))
        .route("/api/youtube/summary", post(youtube_summary))
}
