//! HTTP endpoints for picture books and comic strips.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use tracing::{error, info};

use crate::error::StoryError;
use crate::pipeline::StoryPipeline;
use crate::story::{GenerationRequest, StoryMode};

#[derive(Clone)]
pub(crate) struct AppState {
    pipeline: Arc<StoryPipeline>,
}

impl AppState {
    fn new(pipeline: StoryPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

async fn generate(
    state: &AppState,
    mode: StoryMode,
    request: GenerationRequest,
) -> Result<Json<serde_json::Value>, StoryError> {
    info!(
        "Generating {mode} with {} panels: {}",
        request.panel_count, request.outline
    );
    let rendered = state.pipeline.run(mode, request).await?;
    Ok(Json(rendered))
}

async fn picture_book_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<serde_json::Value>, StoryError> {
    generate(&state, StoryMode::PictureBook, request).await
}

async fn comic_strip_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<serde_json::Value>, StoryError> {
    generate(&state, StoryMode::ComicStrip, request).await
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/picture-book", axum::routing::post(picture_book_handler))
        .route("/comic-strip", axum::routing::post(comic_strip_handler))
}

/// Serves the story endpoints until the listener fails.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    pipeline: StoryPipeline,
) -> Result<(), anyhow::Error> {
    let app = create_router().with_state(AppState::new(pipeline));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
    Ok(())
}
