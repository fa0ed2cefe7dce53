//! Shared constants for prompts, canvases and defaults
//!

use crate::story::CanvasSize;

/// Landscape canvas used for picture-book pages.
pub const PICTURE_BOOK_CANVAS: CanvasSize = CanvasSize {
    width: 1792,
    height: 1024,
};

/// Portrait canvas used for comic-strip panels.
pub const COMIC_STRIP_CANVAS: CanvasSize = CanvasSize {
    width: 1024,
    height: 1792,
};

/// Number of images requested per image-generation call.
pub const IMAGES_PER_REQUEST: u8 = 1;

/// Picture-book narration length band, in characters.
pub const NARRATION_MIN_CHARS: usize = 900;

/// Upper end of the picture-book narration band, in characters.
pub const NARRATION_MAX_CHARS: usize = 1100;

/// Character placement rules for comic-strip panels, keyed by panel index.
pub const COMIC_PLACEMENTS: [(u32, &str); 4] = [
    (1, "Place the character in the bottom right of the frame."),
    (2, "Place the character in the bottom left of the frame."),
    (3, "Place the character in the center of the frame."),
    (4, "Place the character in the bottom left of the frame."),
];

/// Default text model for picture-book narration.
pub const DEFAULT_PICTURE_BOOK_MODEL: &str = "gpt-4o-mini";

/// Default text model for comic-strip dialogue.
pub const DEFAULT_COMIC_STRIP_MODEL: &str = "gpt-4o";

/// Header carrying the API key for Azure-hosted backends.
pub const API_KEY_HEADER: &str = "api-key";

#[cfg(test)]
/// Base URL used for fake image locators in tests
pub const TEST_IMAGE_HOST: &str = "https://images.example.org";
