//! Downloads generated images and inlines them as base64.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::backends::{ImageFetcher, ImagesResponse};
use crate::error::PanelError;
use crate::story::{EncodedImage, Panel, PanelOutcome};

/// Outcome of one panel's download.
pub type MaterializedImage = PanelOutcome<EncodedImage>;

/// Fetches and encodes panel images.
#[derive(Clone)]
pub struct ImageMaterializer {
    fetcher: Arc<dyn ImageFetcher>,
}

impl ImageMaterializer {
    /// Creates a materializer using `fetcher` for downloads.
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetches the first image of `response` and encodes it.
    pub async fn materialize(&self, panel: Panel, response: ImagesResponse) -> MaterializedImage {
        let result = self.try_materialize(&response).await;
        if let Ok(image) = &result {
            debug!(
                "Panel {} image encoded to {} bytes",
                panel.index,
                image.as_str().len()
            );
        }
        PanelOutcome { panel, result }
    }

    async fn try_materialize(&self, response: &ImagesResponse) -> Result<EncodedImage, PanelError> {
        let url = first_image_url(response)?;
        let bytes = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(PanelError::Download)?;
        Ok(EncodedImage::encode(&bytes))
    }
}

/// First image locator of the response, which must be an absolute http(s) URL.
pub(crate) fn first_image_url(response: &ImagesResponse) -> Result<Url, PanelError> {
    let locator = response
        .data
        .first()
        .and_then(|image| image.url.as_deref())
        .map(str::trim)
        .filter(|locator| !locator.is_empty())
        .ok_or_else(|| PanelError::MissingImageUrl("response carries no image url".to_string()))?;

    let url = Url::parse(locator)
        .map_err(|err| PanelError::MissingImageUrl(format!("{locator}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PanelError::MissingImageUrl(format!(
            "{locator}: unsupported scheme"
        )));
    }
    Ok(url)
}
