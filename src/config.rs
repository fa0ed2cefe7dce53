//! Config handling

use std::num::NonZeroUsize;
use std::time::Duration;

use tracing::log::LevelFilter;

use crate::cli::CliOptions;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Text-generation deployments, one per story mode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NarrativeModels {
    /// Deployment for picture-book narration.
    pub picture_book: String,
    /// Deployment for comic-strip dialogue.
    pub comic_strip: String,
}

/// Settings for a [`crate::pipeline::StoryPipeline`].
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Bound on concurrent work items per stage; `None` runs every item at once.
    pub max_concurrency: Option<NonZeroUsize>,
    /// Deadline for a whole run.
    pub deadline: Duration,
    /// Largest accepted `panel_count`.
    pub max_panels: u32,
    /// `user_id` sent to the renderer.
    pub render_user_id: String,
    /// Narrative deployments.
    pub models: NarrativeModels,
}

impl From<&CliOptions> for PipelineConfig {
    fn from(cli: &CliOptions) -> Self {
        Self {
            max_concurrency: cli.max_concurrency,
            deadline: Duration::from_secs(cli.pipeline_deadline),
            max_panels: cli.max_panels,
            render_user_id: cli.render_user_id.clone(),
            models: NarrativeModels {
                picture_book: cli.picture_book_model.clone(),
                comic_strip: cli.comic_strip_model.clone(),
            },
        }
    }
}
