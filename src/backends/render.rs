//! Hosted HTML renderer.

use async_trait::async_trait;
use url::Url;

use super::{RenderBackend, read_success};
use crate::error::BackendError;
use crate::story::RenderRequest;

/// Posts assembled content to the rendering service.
#[derive(Clone, Debug)]
pub struct HtmlRenderClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HtmlRenderClient {
    /// Creates a client posting to `endpoint`.
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl RenderBackend for HtmlRenderClient {
    async fn render(&self, request: &RenderRequest) -> Result<serde_json::Value, BackendError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        let bytes = read_success(resp, "html renderer").await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::{ComicEntry, ContentPayload};
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn sends_comic_content_and_passes_reply_through() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/generate_html")
            .match_body(Matcher::Json(json!({
                "user_id": "reader",
                "is_comic": true,
                "content": [{"img_src": "aGk=", "text": "Hello!"}]
            })))
            .with_status(200)
            .with_body(r#"{"output_html_base64": "PGgxPg=="}"#)
            .create_async()
            .await;

        let endpoint = Url::parse(&format!("{}/generate_html", server.url())).expect("url");
        let request = RenderRequest {
            user_id: "reader".to_string(),
            is_comic: true,
            content: ContentPayload::ComicStrip(vec![ComicEntry {
                img_src: "aGk=".to_string(),
                text: "Hello!".to_string(),
            }]),
        };
        let reply = HtmlRenderClient::new(reqwest::Client::new(), endpoint)
            .render(&request)
            .await
            .expect("render");

        mock.assert_async().await;
        assert_eq!(reply, json!({"output_html_base64": "PGgxPg=="}));
    }

    #[tokio::test]
    async fn non_json_reply_is_a_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let endpoint = Url::parse(&server.url()).expect("url");
        let request = RenderRequest {
            user_id: "reader".to_string(),
            is_comic: false,
            content: ContentPayload::PictureBook {
                img_src_1: String::new(),
                img_src_2: String::new(),
                text: "Once".to_string(),
            },
        };
        let result = HtmlRenderClient::new(reqwest::Client::new(), endpoint)
            .render(&request)
            .await;
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }
}
