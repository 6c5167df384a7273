use std::sync::Arc;

use clap::Parser;
use mandalabrew::config::{AppConfig, setup_logging};
use mandalabrew::generate::OpenAiImageGenerator;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = mandalabrew::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!("Configuration error: {}", err);
            return;
        }
    };

    let generator = Arc::new(OpenAiImageGenerator::new(config.image_model.clone()));

    if let Err(err) =
        mandalabrew::web::setup_server(&cli.listen_address, cli.port, config, generator).await
    {
        error!("Application error: {}", err);
    }
}
