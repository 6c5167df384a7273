//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;

use crate::caption::CaptionStyle;
use crate::constants::{DEFAULT_IMAGE_MODEL, DEFAULT_MAX_AGE};
use crate::generate::ImageSize;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "MANDALABREW_DEBUG")]
    /// Enable debug logging. Env: MANDALABREW_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "MANDALABREW_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: MANDALABREW_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "MANDALABREW_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: MANDALABREW_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, env = "MANDALABREW_PROMPT_TEMPLATE")]
    /// Override the image prompt template; must contain `{age}` and `{mood}`.
    /// Env: MANDALABREW_PROMPT_TEMPLATE
    pub prompt_template: Option<String>,

    #[clap(
        long,
        value_enum,
        default_value = "template",
        env = "MANDALABREW_CAPTION_STYLE"
    )]
    /// Caption style for new records.
    /// Env: MANDALABREW_CAPTION_STYLE
    pub caption_style: CaptionStyle,

    #[clap(
        long,
        value_enum,
        default_value = "1024x1024",
        env = "MANDALABREW_IMAGE_SIZE"
    )]
    /// Image size requested from the API.
    /// Env: MANDALABREW_IMAGE_SIZE
    pub image_size: ImageSize,

    #[clap(long, default_value = DEFAULT_IMAGE_MODEL, env = "MANDALABREW_IMAGE_MODEL")]
    /// Image model passed to the API.
    /// Env: MANDALABREW_IMAGE_MODEL
    pub image_model: String,

    #[clap(long, default_value_t = DEFAULT_MAX_AGE, env = "MANDALABREW_MAX_AGE")]
    /// Oldest age the generation form accepts.
    /// Env: MANDALABREW_MAX_AGE
    pub max_age: u8,
}
