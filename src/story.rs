//! Story data model shared by every stage of the pipeline.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};

use crate::constants::{COMIC_STRIP_CANVAS, PICTURE_BOOK_CANVAS};
use crate::error::{PanelError, StoryError};

/// Which kind of story is being produced.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryMode {
    /// Two illustrated pages with combined narration.
    PictureBook,
    /// One illustrated frame with dialogue per panel.
    ComicStrip,
}

impl StoryMode {
    /// True for comic-strip output, as the renderer expects it.
    pub fn is_comic(self) -> bool {
        matches!(self, Self::ComicStrip)
    }

    /// Canvas size requested from the image backend.
    pub fn canvas(self) -> CanvasSize {
        match self {
            Self::PictureBook => PICTURE_BOOK_CANVAS,
            Self::ComicStrip => COMIC_STRIP_CANVAS,
        }
    }
}

impl fmt::Display for StoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PictureBook => write!(f, "picture-book"),
            Self::ComicStrip => write!(f, "comic-strip"),
        }
    }
}

/// Pixel dimensions of a generated image.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl fmt::Display for CanvasSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Inbound request for one story.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct GenerationRequest {
    /// Number of pages or frames to produce.
    #[serde(alias = "panel_num")]
    pub panel_count: u32,
    /// Premise of the story.
    #[serde(alias = "commit_outline")]
    pub outline: String,
    /// Genre, eg `fantasy`.
    pub genre: String,
    /// Visual or narrative style.
    pub style: String,
}

impl GenerationRequest {
    /// Rejects requests the pipeline cannot serve.
    pub fn validate(&self, max_panels: u32) -> Result<(), StoryError> {
        if self.panel_count == 0 {
            return Err(StoryError::BadRequest(
                "panel_count must be at least 1".to_string(),
            ));
        }
        if self.panel_count > max_panels {
            return Err(StoryError::BadRequest(format!(
                "panel_count must be at most {max_panels}"
            )));
        }
        if self.outline.trim().is_empty() {
            return Err(StoryError::BadRequest("outline must not be empty".to_string()));
        }
        Ok(())
    }
}

/// One page or frame of the story.
///
/// `index` comes from the narrative backend and is the join key for every
/// later stage; it is not the position of the panel in any list.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Panel {
    /// 1-based panel number assigned by the narrative backend.
    pub index: u32,
    /// Who appears in the panel.
    pub character: String,
    /// What the panel shows.
    pub scene: String,
    /// Narration (picture book) or dialogue (comic strip).
    pub text: String,
}

/// Result of one per-panel work item, tagged with its panel.
#[derive(Debug)]
pub struct PanelOutcome<T> {
    /// The panel this work item was for.
    pub panel: Panel,
    /// What the work item produced.
    pub result: Result<T, PanelError>,
}

/// Base64 text of one downloaded image.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Encodes raw image bytes.
    pub fn encode(bytes: &[u8]) -> Self {
        Self(general_purpose::STANDARD.encode(bytes))
    }

    /// Decodes back into the original bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(&self.0)
    }

    /// The encoded text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One frame of a comic strip as the renderer expects it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ComicEntry {
    /// Encoded image for the frame.
    pub img_src: String,
    /// Dialogue for the frame.
    pub text: String,
}

/// Content handed to the rendering backend.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentPayload {
    /// Two image slots plus all narration.
    PictureBook {
        /// First page image, empty when it failed.
        img_src_1: String,
        /// Second page image, empty when it failed.
        img_src_2: String,
        /// Narration of every panel, newline separated.
        text: String,
    },
    /// One entry per panel that produced an image.
    ComicStrip(Vec<ComicEntry>),
}

/// Body sent to the rendering backend.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RenderRequest {
    /// Who the rendering is for.
    pub user_id: String,
    /// Comic-strip layout when true.
    pub is_comic: bool,
    /// The assembled content.
    pub content: ContentPayload,
}
