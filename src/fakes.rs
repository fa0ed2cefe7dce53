//! In-memory backend doubles (testing only)
//!
//! Each fake records what it was asked so tests can assert on call counts and
//! payloads. Image routes are chosen by a marker substring of the prompt, which
//! lets a test fail or delay one specific panel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use crate::backends::{
    ImageBackend, ImageData, ImageFetcher, ImagesResponse, RenderBackend, TextBackend,
};
use crate::error::BackendError;
use crate::story::{CanvasSize, RenderRequest, StoryMode};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

/// Narrative JSON with `count` panels numbered from 1.
///
/// Panel `n` has character `character n`, scene `scene n of the story` and
/// text `line n` in the field the mode expects.
pub fn narrative_json(mode: StoryMode, count: u32) -> String {
    let field = match mode {
        StoryMode::PictureBook => "narration",
        StoryMode::ComicStrip => "dialogue",
    };
    let panels: Vec<serde_json::Value> = (1..=count)
        .map(|n| {
            json!({
                "number": n,
                "character": format!("character {n}"),
                "scene": format!("scene {n} of the story"),
                field: format!("line {n}"),
            })
        })
        .collect();
    json!({"panel_count": count, "panels": panels}).to_string()
}

/// Text backend that always gives the same reply.
#[derive(Debug)]
pub struct ScriptedTextBackend {
    reply: Result<String, BackendError>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedTextBackend {
    /// Replies with `raw` to every prompt.
    pub fn replying(raw: &str) -> Self {
        Self {
            reply: Ok(raw.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replies with [`narrative_json`] for `count` panels.
    pub fn with_panels(mode: StoryMode, count: u32) -> Self {
        Self::replying(&narrative_json(mode, count))
    }

    /// Fails every call with a transport error.
    pub fn failing() -> Self {
        Self {
            reply: Err(BackendError::Transport("text backend unreachable".to_string())),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Waits `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// `(model, prompt)` of every call received.
    pub fn prompts(&self) -> Vec<(String, String)> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl TextBackend for ScriptedTextBackend {
    async fn complete_json(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        lock(&self.prompts).push((model.to_string(), prompt.to_string()));
        pause(self.delay).await;
        self.reply.clone()
    }
}

#[derive(Debug)]
struct ImageRoute {
    marker: String,
    result: Result<ImagesResponse, BackendError>,
    delay: Option<Duration>,
}

/// Image backend routing prompts by marker substring.
///
/// Prompts that match no route get a 404 error.
#[derive(Debug, Default)]
pub struct FakeImageBackend {
    routes: Vec<ImageRoute>,
    calls: AtomicUsize,
    answered: AtomicUsize,
    sizes: Mutex<Vec<CanvasSize>>,
}

impl FakeImageBackend {
    /// A backend with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers prompts containing `marker` with an image at `url`.
    pub fn route(self, marker: &str, url: &str) -> Self {
        self.route_delayed(marker, url, Duration::ZERO)
    }

    /// Like [`FakeImageBackend::route`], answering after `delay`.
    pub fn route_delayed(self, marker: &str, url: &str, delay: Duration) -> Self {
        let response = ImagesResponse {
            data: vec![ImageData {
                url: Some(url.to_string()),
                revised_prompt: None,
            }],
        };
        self.push(marker, Ok(response), Some(delay))
    }

    /// Answers prompts containing `marker` with `response` as-is.
    pub fn respond(self, marker: &str, response: ImagesResponse) -> Self {
        self.push(marker, Ok(response), None)
    }

    /// Fails prompts containing `marker` with `err`.
    pub fn fail(self, marker: &str, err: BackendError) -> Self {
        self.push(marker, Err(err), None)
    }

    fn push(
        mut self,
        marker: &str,
        result: Result<ImagesResponse, BackendError>,
        delay: Option<Duration>,
    ) -> Self {
        self.routes.push(ImageRoute {
            marker: marker.to_string(),
            result,
            delay,
        });
        self
    }

    /// Number of generate calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of generate calls that have returned.
    pub fn answered(&self) -> usize {
        self.answered.load(Ordering::SeqCst)
    }

    /// Canvas size of every call received.
    pub fn sizes(&self) -> Vec<CanvasSize> {
        lock(&self.sizes).clone()
    }
}

#[async_trait]
impl ImageBackend for FakeImageBackend {
    async fn generate(
        &self,
        prompt: &str,
        size: CanvasSize,
    ) -> Result<ImagesResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.sizes).push(size);
        let result = match self
            .routes
            .iter()
            .find(|route| prompt.contains(&route.marker))
        {
            Some(route) => {
                pause(route.delay).await;
                route.result.clone()
            }
            None => Err(BackendError::Status {
                status: 404,
                body: "no route for prompt".to_string(),
            }),
        };
        self.answered.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Image fetcher serving bytes from memory. Unknown URLs get a 404 error.
#[derive(Debug, Default)]
pub struct FakeImageFetcher {
    served: HashMap<String, (Result<Vec<u8>, BackendError>, Option<Duration>)>,
    calls: AtomicUsize,
    watched: Option<Arc<FakeImageBackend>>,
    answered_at_fetch: Mutex<Vec<usize>>,
}

impl FakeImageFetcher {
    /// A fetcher serving nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `bytes` at `url`.
    pub fn serve(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.served.insert(url.to_string(), (Ok(bytes), None));
        self
    }

    /// Serves `bytes` at `url` after `delay`.
    pub fn serve_delayed(mut self, url: &str, bytes: Vec<u8>, delay: Duration) -> Self {
        self.served
            .insert(url.to_string(), (Ok(bytes), Some(delay)));
        self
    }

    /// Fails downloads of `url` with `err`.
    pub fn fail(mut self, url: &str, err: BackendError) -> Self {
        self.served.insert(url.to_string(), (Err(err), None));
        self
    }

    /// Records [`FakeImageBackend::answered`] of `image` as each fetch starts.
    pub fn watching(mut self, image: Arc<FakeImageBackend>) -> Self {
        self.watched = Some(image);
        self
    }

    /// Answered image requests seen by each fetch, in fetch order.
    pub fn answered_at_fetch(&self) -> Vec<usize> {
        lock(&self.answered_at_fetch).clone()
    }

    /// Number of fetches received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for FakeImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(image) = &self.watched {
            lock(&self.answered_at_fetch).push(image.answered());
        }
        match self.served.get(url.as_str()) {
            Some((result, delay)) => {
                pause(*delay).await;
                result.clone()
            }
            None => Err(BackendError::Status {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Renderer that records requests and echoes the content back.
#[derive(Debug)]
pub struct FakeRenderBackend {
    failure: Option<BackendError>,
    requests: Mutex<Vec<RenderRequest>>,
}

impl Default for FakeRenderBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRenderBackend {
    /// Replies `{"rendered": true, "is_comic": .., "content": ..}`.
    pub fn new() -> Self {
        Self {
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every render with `err`.
    pub fn failing(err: BackendError) -> Self {
        Self {
            failure: Some(err),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received.
    pub fn requests(&self) -> Vec<RenderRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl RenderBackend for FakeRenderBackend {
    async fn render(&self, request: &RenderRequest) -> Result<serde_json::Value, BackendError> {
        lock(&self.requests).push(request.clone());
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(json!({
            "rendered": true,
            "is_comic": request.is_comic,
            "content": request.content,
        }))
    }
}
