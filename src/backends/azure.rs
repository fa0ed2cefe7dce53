//! Azure OpenAI chat completions, used for narrative generation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{TextBackend, read_success};
use crate::constants::API_KEY_HEADER;
use crate::error::BackendError;

/// Chat-completions client for an Azure OpenAI resource.
#[derive(Clone, Debug)]
pub struct AzureChatClient {
    http: reqwest::Client,
    endpoint: Url,
    api_version: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AzureChatClient {
    /// Creates a client for the resource at `endpoint`.
    pub fn new(http: reqwest::Client, mut endpoint: Url, api_version: &str, api_key: &str) -> Self {
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Self {
            http,
            endpoint,
            api_version: api_version.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn completions_url(&self, model: &str) -> Result<Url, BackendError> {
        let mut url = self
            .endpoint
            .join(&format!("openai/deployments/{model}/chat/completions"))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

#[async_trait]
impl TextBackend for AzureChatClient {
    async fn complete_json(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        let url = self.completions_url(model)?;
        let body = json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "response_format": {"type": "json_object"}
        });

        let resp = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;
        let bytes = read_success(resp, "chat completions").await?;

        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::Decode("chat completion has no content".to_string()))
    }
}
