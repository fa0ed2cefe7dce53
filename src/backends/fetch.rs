//! Plain GET downloads of generated images.

use async_trait::async_trait;
use url::Url;

use super::{ImageFetcher, read_success};
use crate::error::BackendError;

/// Fetches image bytes over HTTP.
#[derive(Clone, Debug)]
pub struct HttpImageFetcher {
    http: reqwest::Client,
}

impl HttpImageFetcher {
    /// Wraps a shared HTTP client.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, BackendError> {
        let resp = self.http.get(url.clone()).send().await?;
        read_success(resp, "image download").await
    }
}
