use clap::Parser;
use storyforge::backends::Backends;
use storyforge::config::{PipelineConfig, setup_logging};
use storyforge::pipeline::StoryPipeline;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = storyforge::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let backends = match Backends::from_options(&cli) {
        Ok(backends) => backends,
        Err(err) => {
            error!("Failed to build backend clients: {}", err);
            return;
        }
    };
    let pipeline = StoryPipeline::new(backends, PipelineConfig::from(&cli));

    if let Err(err) =
        storyforge::web::setup_server(&cli.listen_address, cli.port, pipeline).await
    {
        error!("Application error: {}", err);
    }
}
