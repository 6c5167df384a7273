//! Config handling

use tracing::log::LevelFilter;

use crate::caption::{CaptionComposer, CaptionStyle};
use crate::cli::CliOptions;
use crate::constants::MIN_AGE;
use crate::error::MandalaError;
use crate::generate::ImageSize;
use crate::prompt::PromptTemplate;

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
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Runtime configuration assembled from CLI options.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Prompt template used for every generation.
    pub prompt: PromptTemplate,
    /// Caption style for new records.
    pub caption_style: CaptionStyle,
    /// Image size requested from the API.
    pub image_size: ImageSize,
    /// Image model passed to the API.
    pub image_model: String,
    /// Oldest age the generation form accepts.
    pub max_age: u8,
}

impl AppConfig {
    /// Builds the runtime configuration, validating the prompt template
    /// and age bound up front so bad deployments fail at startup.
    pub fn from_cli(cli: &CliOptions) -> Result<Self, MandalaError> {
        let prompt = match cli.prompt_template.as_deref() {
            Some(template) => PromptTemplate::new(template)?,
            None => PromptTemplate::default(),
        };
        if cli.max_age < MIN_AGE {
            return Err(MandalaError::Validation(format!(
                "--max-age must be at least {MIN_AGE}"
            )));
        }
        Ok(Self {
            prompt,
            caption_style: cli.caption_style,
            image_size: cli.image_size,
            image_model: cli.image_model.clone(),
            max_age: cli.max_age,
        })
    }

    /// The caption composer for this configuration.
    pub fn composer(&self) -> CaptionComposer {
        CaptionComposer::new(self.caption_style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_line_up_with_the_bundled_template() {
        let cli = CliOptions::parse_from(["mandalabrew"]);
        let config = AppConfig::from_cli(&cli).expect("default config");
        assert_eq!(config.image_model, "dall-e-3");
        assert_eq!(config.image_size, ImageSize::Square1024);
        assert_eq!(config.caption_style, CaptionStyle::Template);
        assert_eq!(config.max_age, 120);
        assert!(config.prompt.build(9, "calm").contains("calm"));
    }

    #[test]
    fn bad_prompt_template_fails_at_startup() {
        let cli = CliOptions::parse_from([
            "mandalabrew",
            "--prompt-template",
            "a mandala with no placeholders",
        ]);
        assert!(matches!(
            AppConfig::from_cli(&cli),
            Err(MandalaError::Validation(_))
        ));
    }

    #[test]
    fn zero_max_age_fails_at_startup() {
        let cli = CliOptions::parse_from(["mandalabrew", "--max-age", "0"]);
        assert!(matches!(
            AppConfig::from_cli(&cli),
            Err(MandalaError::Validation(_))
        ));
    }
}
