//! CLI parser
use clap::Parser;
use std::num::{NonZeroU16, NonZeroUsize};
use url::Url;

use crate::constants::{DEFAULT_COMIC_STRIP_MODEL, DEFAULT_PICTURE_BOOK_MODEL};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "STORYFORGE_DEBUG")]
    /// Enable debug logging. Env: STORYFORGE_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "STORYFORGE_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: STORYFORGE_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "STORYFORGE_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: STORYFORGE_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(
        long,
        default_value = "https://eastus.api.cognitive.microsoft.com/",
        env = "STORYFORGE_TEXT_ENDPOINT"
    )]
    /// Azure OpenAI resource endpoint used for narratives.
    /// Env: STORYFORGE_TEXT_ENDPOINT
    pub text_endpoint: Url,
    #[clap(
        long,
        default_value = "2023-07-01-preview",
        env = "STORYFORGE_TEXT_API_VERSION"
    )]
    /// Azure OpenAI `api-version` query value.
    /// Env: STORYFORGE_TEXT_API_VERSION
    pub text_api_version: String,
    #[clap(long, env = "STORYFORGE_TEXT_API_KEY", hide_env_values = true)]
    /// Azure OpenAI API key. Env: STORYFORGE_TEXT_API_KEY
    pub text_api_key: String,
    #[clap(
        long,
        default_value = DEFAULT_PICTURE_BOOK_MODEL,
        env = "STORYFORGE_PICTURE_BOOK_MODEL"
    )]
    /// Deployment used for picture-book narration.
    /// Env: STORYFORGE_PICTURE_BOOK_MODEL
    pub picture_book_model: String,
    #[clap(
        long,
        default_value = DEFAULT_COMIC_STRIP_MODEL,
        env = "STORYFORGE_COMIC_STRIP_MODEL"
    )]
    /// Deployment used for comic-strip dialogue.
    /// Env: STORYFORGE_COMIC_STRIP_MODEL
    pub comic_strip_model: String,

    #[clap(long, env = "STORYFORGE_IMAGE_ENDPOINT")]
    /// Full image-generation URL, including any `api-version` query.
    /// Env: STORYFORGE_IMAGE_ENDPOINT
    pub image_endpoint: Url,
    #[clap(long, env = "STORYFORGE_IMAGE_API_KEY", hide_env_values = true)]
    /// Image-generation API key. Env: STORYFORGE_IMAGE_API_KEY
    pub image_api_key: String,

    #[clap(long, env = "STORYFORGE_RENDER_ENDPOINT")]
    /// HTML rendering service URL. Env: STORYFORGE_RENDER_ENDPOINT
    pub render_endpoint: Url,
    #[clap(long, default_value = "storyforge", env = "STORYFORGE_RENDER_USER_ID")]
    /// `user_id` sent with every rendering request.
    /// Env: STORYFORGE_RENDER_USER_ID
    pub render_user_id: String,

    #[clap(long, env = "STORYFORGE_MAX_CONCURRENCY")]
    /// Upper bound on concurrent work items per stage. Unset means one worker per panel.
    /// Env: STORYFORGE_MAX_CONCURRENCY
    pub max_concurrency: Option<NonZeroUsize>,
    #[clap(long, default_value = "120", env = "STORYFORGE_REQUEST_TIMEOUT")]
    /// Timeout for each outbound HTTP call, in seconds.
    /// Env: STORYFORGE_REQUEST_TIMEOUT
    pub request_timeout: u64,
    #[clap(long, default_value = "600", env = "STORYFORGE_PIPELINE_DEADLINE")]
    /// Deadline for a whole story run, in seconds.
    /// Env: STORYFORGE_PIPELINE_DEADLINE
    pub pipeline_deadline: u64,
    #[clap(long, default_value = "8", env = "STORYFORGE_MAX_PANELS")]
    /// Largest `panel_count` accepted. Env: STORYFORGE_MAX_PANELS
    pub max_panels: u32,
}
