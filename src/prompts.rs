//! Prompt templates for the narrative and image backends.
//!
//! Narrative prompts ask for a JSON object with a `panels` array whose items
//! carry `number`, `character`, `scene` and either `narration` (picture book)
//! or `dialogue` (comic strip).

use std::fmt::Write;

use crate::constants::{COMIC_PLACEMENTS, NARRATION_MAX_CHARS, NARRATION_MIN_CHARS};
use crate::story::{GenerationRequest, Panel, StoryMode};

const COMIC_FEW_SHOT: &str = r#"### Example input
panel_count: 3
outline: A lighthouse keeper finds a lost seal pup
genre: slice of life
style: seaside

### Example output
{
    "panel_count": 3,
    "outline": "A lighthouse keeper finds a lost seal pup",
    "genre": "slice of life",
    "style": "seaside",
    "panels": [
        {
            "number": 1,
            "character": "Lighthouse keeper",
            "dialogue": "Who is crying down on the rocks?",
            "scene": "A rocky shore at dawn. An old keeper in a yellow raincoat holds a lantern. The lighthouse stands behind him."
        },
        {
            "number": 2,
            "character": "Seal pup",
            "dialogue": "Mew... mew...",
            "scene": "A small grey seal pup curled up between wet rocks, waves foaming nearby."
        },
        {
            "number": 3,
            "character": "Lighthouse keeper",
            "dialogue": "Let's find your mother together.",
            "scene": "The keeper kneels beside the pup and smiles. The sea glows orange in the sunrise."
        }
    ]
}

### Another example input
panel_count: 3
outline: A small robot learns to bake bread
genre: comedy
style: retro future

### Example output
{
    "panel_count": 3,
    "outline": "A small robot learns to bake bread",
    "genre": "comedy",
    "style": "retro future",
    "panels": [
        {
            "number": 1,
            "character": "Robot",
            "dialogue": "Step one: add flour. How hard can it be?",
            "scene": "A chrome kitchen with round windows. A small round robot holds a bag of flour with two claws."
        },
        {
            "number": 2,
            "character": "Baker",
            "dialogue": "That is far too much flour!",
            "scene": "A cloud of flour fills the kitchen. A plump baker in an apron waves her arms."
        },
        {
            "number": 3,
            "character": "Robot",
            "dialogue": "Bread achieved. Mostly.",
            "scene": "The robot proudly presents a lopsided loaf on a tray, covered head to toe in flour."
        }
    ]
}"#;

/// Instruction sent to the narrative backend for one story.
pub fn narrative_prompt(mode: StoryMode, request: &GenerationRequest) -> String {
    match mode {
        StoryMode::PictureBook => picture_book_narrative(request),
        StoryMode::ComicStrip => comic_strip_narrative(request),
    }
}

fn echo_input(out: &mut String, request: &GenerationRequest) {
    let _ = writeln!(out, "panel_count: {}", request.panel_count);
    let _ = writeln!(out, "outline: {}", request.outline);
    let _ = writeln!(out, "genre: {}", request.genre);
    let _ = writeln!(out, "style: {}", request.style);
}

fn output_format(out: &mut String, request: &GenerationRequest, text_field: &str) {
    let _ = writeln!(out, "{{");
    let _ = writeln!(out, "    \"panel_count\": {},", request.panel_count);
    let _ = writeln!(out, "    \"outline\": {:?},", request.outline);
    let _ = writeln!(out, "    \"genre\": {:?},", request.genre);
    let _ = writeln!(out, "    \"style\": {:?},", request.style);
    let _ = writeln!(out, "    \"panels\": [");
    let _ = writeln!(out, "        {{");
    let _ = writeln!(out, "            \"number\": <panel number>,");
    let _ = writeln!(out, "            \"character\": \"<character>\",");
    let _ = writeln!(out, "            \"{text_field}\": \"<{text_field}>\",");
    let _ = writeln!(out, "            \"scene\": \"<scene>\"");
    let _ = writeln!(out, "        }}");
    let _ = writeln!(out, "    ]");
    let _ = writeln!(out, "}}");
}

fn picture_book_narrative(request: &GenerationRequest) -> String {
    let mut out = format!(
        "Using the input below, write the narration of a {}-page picture book and return it in the JSON format shown.\n\n### Input\n",
        request.panel_count
    );
    echo_input(&mut out, request);
    out.push_str("\n### Output format\n");
    output_format(&mut out, request, "narration");
    out.push_str("\n### Most important\n");
    let _ = writeln!(
        out,
        "- The narration must total {NARRATION_MIN_CHARS} to {NARRATION_MAX_CHARS} characters. Running slightly long is fine; running short is not."
    );
    let _ = writeln!(
        out,
        "- The story must be complete within {} page(s). With a single page, tell a story that ends on that page.",
        request.panel_count
    );
    let _ = writeln!(
        out,
        "- Number the panels 1 to {} and return exactly that many.",
        request.panel_count
    );
    out
}

fn comic_strip_narrative(request: &GenerationRequest) -> String {
    let mut out = format!(
        "Using the input below, write the dialogue of a {}-panel comic strip and return it in the JSON format shown.\n\n### Input\n",
        request.panel_count
    );
    echo_input(&mut out, request);
    out.push_str("\n### Output format\n");
    output_format(&mut out, request, "dialogue");
    out.push_str("\n### Most important\n");
    out.push_str("- The output is used directly as an image-generation prompt. Do not include wording or subjects that a content filter would reject.\n");
    out.push_str("- Each panel carries spoken dialogue only, no narration.\n");
    let _ = writeln!(
        out,
        "- Number the panels 1 to {} and return exactly that many.",
        request.panel_count
    );
    out.push('\n');
    out.push_str(COMIC_FEW_SHOT);
    out.push('\n');
    out
}

/// Character placement rule for a comic-strip panel, if the index has one.
pub fn placement_directive(index: u32) -> Option<&'static str> {
    COMIC_PLACEMENTS
        .iter()
        .find(|(panel, _)| *panel == index)
        .map(|(_, directive)| *directive)
}

/// Image-generation prompt for one panel.
pub fn image_prompt(mode: StoryMode, panel: &Panel, genre: &str, style: &str) -> String {
    match mode {
        StoryMode::PictureBook => format!(
            "Create an illustration from the information below.\n\n\
             - Do not include any text in the image.\n\
             - Draw the scene and character with soft colors and a warm touch.\n\
             - Use the following details:\n  \
             - Genre: {genre}\n  \
             - Style: {style}\n  \
             - Scene: {}\n  \
             - Character: {}\n",
            panel.scene, panel.character
        ),
        StoryMode::ComicStrip => {
            let mut out = String::from(
                "Create the artwork for one comic panel from the information below.\n\n\
                 # Most important\n\
                 - Do not draw speech bubbles.\n\
                 - Do not include any text in the image.\n\
                 - Draw exactly one panel; never combine several panels in one image.\n\
                 - Dialogue is added later, so focus on the picture.\n",
            );
            if let Some(directive) = placement_directive(panel.index) {
                let _ = writeln!(out, "- {directive}");
            }
            out.push_str("\n# Details\n");
            let _ = writeln!(out, "- Genre: {genre}");
            let _ = writeln!(out, "- Style: {style}");
            let _ = writeln!(out, "- Scene: {}", panel.scene);
            let _ = writeln!(out, "- Character: {}", panel.character);
            let _ = writeln!(out, "- Dialogue: {}", panel.text);
            let _ = write!(out, "- Panel number: {}", panel.index);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            panel_count: 4,
            outline: "A cat opens a bakery".to_string(),
            genre: "comedy".to_string(),
            style: "pastel".to_string(),
        }
    }

    fn panel(index: u32) -> Panel {
        Panel {
            index,
            character: "Cat".to_string(),
            scene: "A tiny bakery".to_string(),
            text: "Fresh bread!".to_string(),
        }
    }

    #[test]
    fn picture_book_narrative_names_the_length_band_and_field() {
        let prompt = narrative_prompt(StoryMode::PictureBook, &request());
        assert!(prompt.contains("4-page picture book"));
        assert!(prompt.contains("900 to 1100 characters"));
        assert!(prompt.contains("\"narration\""));
        assert!(!prompt.contains("\"dialogue\""));
    }

    #[test]
    fn comic_narrative_carries_few_shot_examples() {
        let prompt = narrative_prompt(StoryMode::ComicStrip, &request());
        assert!(prompt.contains("4-panel comic strip"));
        assert!(prompt.contains("content filter"));
        assert!(prompt.contains("A small robot learns to bake bread"));
        assert!(prompt.contains("\"dialogue\""));
    }

    #[test]
    fn known_indices_get_placement() {
        assert_eq!(
            placement_directive(1),
            Some("Place the character in the bottom right of the frame.")
        );
        assert_eq!(placement_directive(2), placement_directive(4));
        assert!(placement_directive(3).is_some_and(|d| d.contains("center")));
    }

    #[test]
    fn unknown_indices_get_no_placement() {
        assert_eq!(placement_directive(0), None);
        assert_eq!(placement_directive(5), None);

        let prompt = image_prompt(StoryMode::ComicStrip, &panel(7), "comedy", "pastel");
        assert!(!prompt.contains("Place the character"));
        assert!(prompt.contains("Panel number: 7"));
    }

    #[test]
    fn comic_image_prompt_forbids_bubbles_and_places_character() {
        let prompt = image_prompt(StoryMode::ComicStrip, &panel(3), "comedy", "pastel");
        assert!(prompt.contains("Do not draw speech bubbles."));
        assert!(prompt.contains("Place the character in the center of the frame."));
        assert!(prompt.contains("Dialogue: Fresh bread!"));
    }

    #[test]
    fn picture_book_image_prompt_is_text_free_and_warm() {
        let prompt = image_prompt(StoryMode::PictureBook, &panel(1), "comedy", "pastel");
        assert!(prompt.contains("Do not include any text in the image."));
        assert!(prompt.contains("soft colors and a warm touch"));
        assert!(prompt.contains("Scene: A tiny bakery"));
        assert!(!prompt.contains("Place the character"));
    }
}
