//! Hosted backends the pipeline talks to, and their HTTP clients.
//!
//! Each backend sits behind a trait so the pipeline can be driven by the
//! in-memory doubles in [`crate::fakes`]. The HTTP implementations share one
//! [`reqwest::Client`] built with the per-call timeout.

mod azure;
mod dalle;
mod fetch;
mod render;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

pub use azure::AzureChatClient;
pub use dalle::DalleClient;
pub use fetch::HttpImageFetcher;
pub use render::HtmlRenderClient;

use crate::cli::CliOptions;
use crate::error::BackendError;
use crate::story::{CanvasSize, RenderRequest};

/// Large-language-model backend that answers with JSON.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Sends one prompt to `model` and returns the JSON text of the reply.
    async fn complete_json(&self, model: &str, prompt: &str) -> Result<String, BackendError>;
}

/// Image-synthesis backend.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Requests a single image of `size` for `prompt`.
    async fn generate(&self, prompt: &str, size: CanvasSize)
    -> Result<ImagesResponse, BackendError>;
}

/// Downloads generated images.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Returns the raw bytes behind `url`.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, BackendError>;
}

/// Hosted HTML renderer.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Renders the story; the reply is passed through untouched.
    async fn render(&self, request: &RenderRequest) -> Result<serde_json::Value, BackendError>;
}

/// Response of an image-generation call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ImagesResponse {
    /// Generated images, normally exactly one.
    #[serde(default)]
    pub data: Vec<ImageData>,
}

/// One generated image.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ImageData {
    /// Where the image can be fetched from.
    #[serde(default)]
    pub url: Option<String>,
    /// Prompt after the backend's own rewriting, if reported.
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

/// Every backend a story run needs.
#[derive(Clone)]
pub struct Backends {
    /// Narrative generation.
    pub text: Arc<dyn TextBackend>,
    /// Panel image generation.
    pub image: Arc<dyn ImageBackend>,
    /// Generated image download.
    pub fetcher: Arc<dyn ImageFetcher>,
    /// Final HTML rendering.
    pub render: Arc<dyn RenderBackend>,
}

impl Backends {
    /// Builds the HTTP clients described by the CLI options.
    pub fn from_options(cli: &CliOptions) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cli.request_timeout))
            .build()?;

        Ok(Self {
            text: Arc::new(AzureChatClient::new(
                http.clone(),
                cli.text_endpoint.clone(),
                &cli.text_api_version,
                &cli.text_api_key,
            )),
            image: Arc::new(DalleClient::new(
                http.clone(),
                cli.image_endpoint.clone(),
                &cli.image_api_key,
            )),
            fetcher: Arc::new(HttpImageFetcher::new(http.clone())),
            render: Arc::new(HtmlRenderClient::new(http, cli.render_endpoint.clone())),
        })
    }
}

/// Reads the body of `resp`, turning a non-success status into an error.
pub(crate) async fn read_success(
    resp: reqwest::Response,
    what: &str,
) -> Result<Vec<u8>, BackendError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    debug!("{what} answered {status} with {} bytes", bytes.len());
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    Ok(bytes.to_vec())
}
