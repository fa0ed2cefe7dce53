//! Per-panel image generation requests.

use std::sync::Arc;

use tracing::debug;

use crate::backends::{ImageBackend, ImagesResponse};
use crate::error::PanelError;
use crate::prompts::image_prompt;
use crate::story::{Panel, PanelOutcome, StoryMode};

/// Outcome of one panel's image-generation request.
pub type ImageResult = PanelOutcome<ImagesResponse>;

/// Issues one image-generation request per panel.
#[derive(Clone)]
pub struct PanelImageRequester {
    backend: Arc<dyn ImageBackend>,
    mode: StoryMode,
    genre: String,
    style: String,
}

impl PanelImageRequester {
    /// Creates a requester for one story's genre and style.
    pub fn new(backend: Arc<dyn ImageBackend>, mode: StoryMode, genre: &str, style: &str) -> Self {
        Self {
            backend,
            mode,
            genre: genre.to_string(),
            style: style.to_string(),
        }
    }

    /// Requests the panel's image. Failures come back as a tagged error value.
    pub async fn request(&self, panel: Panel) -> ImageResult {
        let prompt = image_prompt(self.mode, &panel, &self.genre, &self.style);
        debug!("Panel {} image prompt: {prompt}", panel.index);
        let result = self
            .backend
            .generate(&prompt, self.mode.canvas())
            .await
            .map_err(PanelError::ImageRequest);
        PanelOutcome { panel, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::fakes::FakeImageBackend;

    fn panel(index: u32) -> Panel {
        Panel {
            index,
            character: "Owl".to_string(),
            scene: format!("scene {index} of the story"),
            text: "Hoot".to_string(),
        }
    }

    #[tokio::test]
    async fn uses_mode_canvas_and_returns_tagged_response() {
        let backend = Arc::new(
            FakeImageBackend::new().route("scene 1 of", "https://images.example.org/1.png"),
        );
        let requester =
            PanelImageRequester::new(backend.clone(), StoryMode::ComicStrip, "fable", "ink");

        let outcome = requester.request(panel(1)).await;

        assert_eq!(outcome.panel.index, 1);
        let response = outcome.result.expect("image response");
        assert_eq!(
            response.data[0].url.as_deref(),
            Some("https://images.example.org/1.png")
        );
        let sizes = backend.sizes();
        assert_eq!(sizes, vec![StoryMode::ComicStrip.canvas()]);
    }

    #[tokio::test]
    async fn backend_error_becomes_panel_failure() {
        let backend = Arc::new(FakeImageBackend::new().fail(
            "scene 2 of",
            BackendError::Transport("connection reset".to_string()),
        ));
        let requester = PanelImageRequester::new(backend, StoryMode::PictureBook, "fable", "ink");

        let outcome = requester.request(panel(2)).await;

        assert_eq!(outcome.panel, panel(2));
        assert!(matches!(
            outcome.result,
            Err(PanelError::ImageRequest(BackendError::Transport(_)))
        ));
    }
}
