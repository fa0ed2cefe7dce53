//! The story pipeline: narrative, parallel image requests, parallel
//! downloads, assembly and rendering.

mod assemble;
mod fanout;
mod materializer;
mod narrative;
mod requester;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

pub use assemble::assemble;
pub use fanout::{StageReport, WorkerPool};
pub use materializer::{ImageMaterializer, MaterializedImage};
pub use narrative::NarrativeGenerator;
pub use requester::{ImageResult, PanelImageRequester};

use crate::backends::{Backends, ImageBackend, RenderBackend};
use crate::config::PipelineConfig;
use crate::error::StoryError;
use crate::story::{ContentPayload, EncodedImage, GenerationRequest, RenderRequest, StoryMode};

/// Runs whole stories against a set of backends. Holds no per-run state.
#[derive(Clone)]
pub struct StoryPipeline {
    narrative: NarrativeGenerator,
    images: Arc<dyn ImageBackend>,
    materializer: Arc<ImageMaterializer>,
    render: Arc<dyn RenderBackend>,
    pool: WorkerPool,
    deadline: Duration,
    max_panels: u32,
    render_user_id: String,
}

impl StoryPipeline {
    /// Wires the pipeline to `backends`.
    pub fn new(backends: Backends, config: PipelineConfig) -> Self {
        Self {
            narrative: NarrativeGenerator::new(backends.text, config.models),
            images: backends.image,
            materializer: Arc::new(ImageMaterializer::new(backends.fetcher)),
            render: backends.render,
            pool: WorkerPool::new(config.max_concurrency),
            deadline: config.deadline,
            max_panels: config.max_panels,
            render_user_id: config.render_user_id,
        }
    }

    /// Produces a story and returns the renderer's reply.
    pub async fn run(
        &self,
        mode: StoryMode,
        request: GenerationRequest,
    ) -> Result<serde_json::Value, StoryError> {
        request.validate(self.max_panels)?;
        timeout(self.deadline, self.generate_and_render(mode, &request))
            .await
            .map_err(|_| StoryError::DeadlineExceeded(self.deadline))?
    }

    async fn generate_and_render(
        &self,
        mode: StoryMode,
        request: &GenerationRequest,
    ) -> Result<serde_json::Value, StoryError> {
        let content = self.build_content(mode, request).await?;
        let render_request = RenderRequest {
            user_id: self.render_user_id.clone(),
            is_comic: mode.is_comic(),
            content,
        };
        self.render
            .render(&render_request)
            .await
            .map_err(StoryError::RenderingBackend)
    }

    /// Runs every stage up to assembly, without rendering.
    pub async fn build_content(
        &self,
        mode: StoryMode,
        request: &GenerationRequest,
    ) -> Result<ContentPayload, StoryError> {
        let panels = self.narrative.generate(request, mode).await?;

        let requester = Arc::new(PanelImageRequester::new(
            Arc::clone(&self.images),
            mode,
            &request.genre,
            &request.style,
        ));
        let generated = self
            .pool
            .run(
                "image request",
                panels.iter().map(|panel| (panel.clone(), ())).collect(),
                |panel, ()| {
                    let requester = Arc::clone(&requester);
                    async move { requester.request(panel).await }
                },
            )
            .await;

        let materializer = Arc::clone(&self.materializer);
        let downloaded = self
            .pool
            .run("image download", generated.succeeded, |panel, response| {
                let materializer = Arc::clone(&materializer);
                async move { materializer.materialize(panel, response).await }
            })
            .await;

        let mut images: HashMap<u32, EncodedImage> = HashMap::with_capacity(panels.len());
        for (panel, image) in downloaded.succeeded {
            if images.insert(panel.index, image).is_some() {
                warn!("Panel {} produced more than one image, keeping the last", panel.index);
            }
        }
        info!(
            "{mode}: {} of {} panels have images",
            images.len(),
            panels.len()
        );

        Ok(assemble(mode, request.panel_count, &panels, &images))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NarrativeModels;
    use crate::error::BackendError;
    use crate::fakes::{FakeImageBackend, FakeImageFetcher, FakeRenderBackend, ScriptedTextBackend};

    fn config() -> PipelineConfig {
        PipelineConfig {
            max_concurrency: None,
            deadline: Duration::from_secs(5),
            max_panels: 8,
            render_user_id: "reader".to_string(),
            models: NarrativeModels {
                picture_book: "book".to_string(),
                comic_strip: "comic".to_string(),
            },
        }
    }

    fn request(panel_count: u32) -> GenerationRequest {
        GenerationRequest {
            panel_count,
            outline: "A turtle races a snail".to_string(),
            genre: "fable".to_string(),
            style: "gouache".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_narrative_issues_no_image_requests() {
        let text = Arc::new(ScriptedTextBackend::replying(r#"{"panels": []}"#));
        let image = Arc::new(FakeImageBackend::new());
        let render = Arc::new(FakeRenderBackend::new());
        let pipeline = StoryPipeline::new(
            Backends {
                text,
                image: image.clone(),
                fetcher: Arc::new(FakeImageFetcher::new()),
                render: render.clone(),
            },
            config(),
        );

        let result = pipeline.run(StoryMode::PictureBook, request(2)).await;

        assert!(matches!(result, Err(StoryError::EmptyNarrative)));
        assert_eq!(image.calls(), 0);
        assert!(render.requests().is_empty());
    }

    #[tokio::test]
    async fn invalid_request_makes_no_backend_calls() {
        let text = Arc::new(ScriptedTextBackend::with_panels(StoryMode::PictureBook, 1));
        let pipeline = StoryPipeline::new(
            Backends {
                text: text.clone(),
                image: Arc::new(FakeImageBackend::new()),
                fetcher: Arc::new(FakeImageFetcher::new()),
                render: Arc::new(FakeRenderBackend::new()),
            },
            config(),
        );

        let result = pipeline.run(StoryMode::PictureBook, request(0)).await;

        assert!(matches!(result, Err(StoryError::BadRequest(_))));
        assert_eq!(text.calls(), 0);
    }

    #[tokio::test]
    async fn renderer_failure_fails_the_run() {
        let pipeline = StoryPipeline::new(
            Backends {
                text: Arc::new(ScriptedTextBackend::with_panels(StoryMode::ComicStrip, 1)),
                image: Arc::new(FakeImageBackend::new()),
                fetcher: Arc::new(FakeImageFetcher::new()),
                render: Arc::new(FakeRenderBackend::failing(BackendError::Status {
                    status: 503,
                    body: "down".to_string(),
                })),
            },
            config(),
        );

        let result = pipeline.run(StoryMode::ComicStrip, request(1)).await;

        assert!(matches!(result, Err(StoryError::RenderingBackend(_))));
    }

    #[tokio::test]
    async fn slow_backend_hits_the_deadline() {
        let mut config = config();
        config.deadline = Duration::from_millis(20);
        let pipeline = StoryPipeline::new(
            Backends {
                text: Arc::new(
                    ScriptedTextBackend::with_panels(StoryMode::PictureBook, 1)
                        .delayed(Duration::from_secs(5)),
                ),
                image: Arc::new(FakeImageBackend::new()),
                fetcher: Arc::new(FakeImageFetcher::new()),
                render: Arc::new(FakeRenderBackend::new()),
            },
            config,
        );

        let result = pipeline.run(StoryMode::PictureBook, request(1)).await;

        assert!(matches!(result, Err(StoryError::DeadlineExceeded(_))));
    }
}
