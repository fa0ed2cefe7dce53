//! DALL-E style image generation endpoint.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::{ImageBackend, ImagesResponse, read_success};
use crate::constants::{API_KEY_HEADER, IMAGES_PER_REQUEST};
use crate::error::BackendError;
use crate::story::CanvasSize;

/// Client for an image-generation deployment.
#[derive(Clone, Debug)]
pub struct DalleClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

/// Request body for the images/generations call
#[derive(Serialize, Debug)]
struct ImagesGenerateRequest<'a> {
    prompt: &'a str,
    n: u8,
    size: String,
}

impl DalleClient {
    /// Creates a client posting to `endpoint`, which already carries any query string.
    pub fn new(http: reqwest::Client, endpoint: Url, api_key: &str) -> Self {
        Self {
            http,
            endpoint,
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl ImageBackend for DalleClient {
    async fn generate(
        &self,
        prompt: &str,
        size: CanvasSize,
    ) -> Result<ImagesResponse, BackendError> {
        let body = ImagesGenerateRequest {
            prompt,
            n: IMAGES_PER_REQUEST,
            size: size.to_string(),
        };

        let resp = self
            .http
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;
        let bytes = read_success(resp, "image generation").await?;

        let parsed: ImagesResponse = serde_json::from_slice(&bytes)?;
        if let Some(revised) = parsed.data.first().and_then(|d| d.revised_prompt.as_deref()) {
            debug!("Revised prompt from image backend: {revised}");
        }
        Ok(parsed)
    }
}
