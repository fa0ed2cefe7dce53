//! Narrative generation: one text-backend call turning an outline into panels.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::backends::TextBackend;
use crate::config::NarrativeModels;
use crate::error::StoryError;
use crate::prompts::narrative_prompt;
use crate::story::{GenerationRequest, Panel, StoryMode};

/// JSON document returned by the narrative backend. Echoed request fields are ignored.
#[derive(Debug, Deserialize)]
struct NarrativeDocument {
    #[serde(default)]
    panels: Vec<RawPanel>,
}

#[derive(Debug, Deserialize)]
struct RawPanel {
    number: u32,
    #[serde(default)]
    character: String,
    #[serde(default)]
    scene: String,
    #[serde(default)]
    narration: Option<String>,
    #[serde(default)]
    dialogue: Option<String>,
}

impl RawPanel {
    fn into_panel(self, mode: StoryMode) -> Panel {
        let (preferred, fallback) = match mode {
            StoryMode::PictureBook => (self.narration, self.dialogue),
            StoryMode::ComicStrip => (self.dialogue, self.narration),
        };
        Panel {
            index: self.number,
            character: self.character,
            scene: self.scene,
            text: preferred.or(fallback).unwrap_or_default(),
        }
    }
}

/// Turns a [`GenerationRequest`] into panels.
#[derive(Clone)]
pub struct NarrativeGenerator {
    text: Arc<dyn TextBackend>,
    models: NarrativeModels,
}

impl NarrativeGenerator {
    /// Creates a generator backed by `text`.
    pub fn new(text: Arc<dyn TextBackend>, models: NarrativeModels) -> Self {
        Self { text, models }
    }

    /// Generates the panels for one story. Makes exactly one backend call.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        mode: StoryMode,
    ) -> Result<Vec<Panel>, StoryError> {
        let model = match mode {
            StoryMode::PictureBook => &self.models.picture_book,
            StoryMode::ComicStrip => &self.models.comic_strip,
        };
        let prompt = narrative_prompt(mode, request);
        debug!("Requesting {mode} narrative from {model}, prompt is {} bytes", prompt.len());

        let raw = self
            .text
            .complete_json(model, &prompt)
            .await
            .map_err(StoryError::NarrativeBackend)?;
        let panels = parse_panels(&raw, mode)?;

        if panels.len() != request.panel_count as usize {
            warn!(
                "Asked for {} panels, narrative backend returned {}",
                request.panel_count,
                panels.len()
            );
        }
        info!("Generated {mode} narrative with {} panels", panels.len());
        Ok(panels)
    }
}

/// Parses the backend reply, keeping panels in the order the backend sent them.
pub(crate) fn parse_panels(raw: &str, mode: StoryMode) -> Result<Vec<Panel>, StoryError> {
    let document: NarrativeDocument = serde_json::from_str(raw)
        .map_err(|err| StoryError::MalformedResponse(err.to_string()))?;
    if document.panels.is_empty() {
        return Err(StoryError::EmptyNarrative);
    }

    let mut seen = HashSet::new();
    let mut panels = Vec::with_capacity(document.panels.len());
    for raw_panel in document.panels {
        if !seen.insert(raw_panel.number) {
            return Err(StoryError::MalformedResponse(format!(
                "panel number {} appears more than once",
                raw_panel.number
            )));
        }
        panels.push(raw_panel.into_panel(mode));
    }
    Ok(panels)
}
