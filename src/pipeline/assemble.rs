//! Builds the renderer's content payload from panels and their images.

use std::collections::HashMap;

use crate::story::{ComicEntry, ContentPayload, EncodedImage, Panel, StoryMode};

/// Assembles the content for `mode`.
///
/// `images` is keyed by panel index; panels without an entry get an empty
/// image slot (picture book) or no entry (comic strip). Output order always
/// follows the panel index, never the order images arrived in.
///
/// `panel_count` is the count the caller asked for. A one-page picture book
/// uses only its lowest-index panel, whatever the narrative returned.
pub fn assemble(
    mode: StoryMode,
    panel_count: u32,
    panels: &[Panel],
    images: &HashMap<u32, EncodedImage>,
) -> ContentPayload {
    let mut sorted: Vec<&Panel> = panels.iter().collect();
    sorted.sort_by_key(|panel| panel.index);

    match mode {
        StoryMode::PictureBook if panel_count == 1 => single_page(sorted.first(), images),
        StoryMode::PictureBook => picture_book(&sorted, images),
        StoryMode::ComicStrip => comic_strip(&sorted, images),
    }
}

fn image_for(panel: Option<&&Panel>, images: &HashMap<u32, EncodedImage>) -> String {
    panel
        .and_then(|panel| images.get(&panel.index))
        .map(|image| image.as_str().to_string())
        .unwrap_or_default()
}

fn single_page(panel: Option<&&Panel>, images: &HashMap<u32, EncodedImage>) -> ContentPayload {
    let image = image_for(panel, images);
    ContentPayload::PictureBook {
        img_src_1: image.clone(),
        img_src_2: image,
        text: panel.map(|panel| panel.text.clone()).unwrap_or_default(),
    }
}

fn picture_book(sorted: &[&Panel], images: &HashMap<u32, EncodedImage>) -> ContentPayload {
    let img_src_1 = image_for(sorted.first(), images);
    let img_src_2 = image_for(sorted.get(1), images);
    let text = sorted
        .iter()
        .map(|panel| panel.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    ContentPayload::PictureBook {
        img_src_1,
        img_src_2,
        text,
    }
}

fn comic_strip(sorted: &[&Panel], images: &HashMap<u32, EncodedImage>) -> ContentPayload {
    ContentPayload::ComicStrip(
        sorted
            .iter()
            .filter_map(|panel| {
                images.get(&panel.index).map(|image| ComicEntry {
                    img_src: image.as_str().to_string(),
                    text: panel.text.clone(),
                })
            })
            .collect(),
    )
}
