use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use studyflow::{
    api::{api_router, AppState},
    AppConfig, Studio,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // -----------------------------
    // Configuration / Dependencies
    // -----------------------------
    let config = AppConfig::from_env();
    let addr = config.bind_addr.clone();
    let studio = Studio::from_config(config)?;

    let state = AppState::new(studio);

    // -----------------------------
    // Routers
    // -----------------------------
    let app = Router::new()
        .merge(api_router())
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = addr.as_str(), "studyflow listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
