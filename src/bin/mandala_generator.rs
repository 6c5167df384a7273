use anyhow::{Context, Result, anyhow};
use clap::Parser;
use mandalabrew::caption::{CaptionComposer, CaptionStyle};
use mandalabrew::generate::{
    GenerationRequest, ImageGenerator, ImageSize, OpenAiImageGenerator,
};
use mandalabrew::history::ImageRef;
use mandalabrew::prompt::PromptTemplate;
use std::fs;
use std::path::PathBuf;

/// Generate one mandala from the command line.
///
/// Minimal UX:
///   mandala_generator 34 peaceful
#[derive(Parser, Debug)]
#[command(name = "mandala_generator")]
#[command(about = "Generate a mood mandala via the Images API and save it as a PNG")]
struct Args {
    /// Age to generate for
    age: u8,

    /// Mood to generate for (e.g. peaceful, excited, nostalgic)
    mood: String,

    /// OpenAI API key
    #[arg(required = true, long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// Image model
    #[arg(long, default_value = "dall-e-3")]
    image_model: String,

    /// Requested image size
    #[arg(long, value_enum, default_value = "1024x1024")]
    size: ImageSize,

    /// Caption style printed alongside the image
    #[arg(long, value_enum, default_value = "template")]
    caption_style: CaptionStyle,

    /// Override the prompt template; must contain {age} and {mood}
    #[arg(long)]
    prompt_template: Option<String>,

    /// Output file for the PNG
    #[arg(long, default_value = "mandala.png")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.out.exists() {
        return Err(anyhow!("Output already exists: {}", args.out.display()));
    }

    let request = GenerationRequest::new(
        args.age,
        &args.mood,
        &args.openai_api_key,
        mandalabrew::constants::DEFAULT_MAX_AGE,
    )?;
    let template = match args.prompt_template.as_deref() {
        Some(template) => PromptTemplate::new(template)?,
        None => PromptTemplate::default(),
    };
    let prompt = template.build(request.age, &request.mood);
    eprintln!("Prompt: {prompt}");

    let generator = OpenAiImageGenerator::new(args.image_model);
    let generated = generator
        .generate(&prompt, args.size, &request.api_key)
        .await?;

    let bytes = match generated.image {
        ImageRef::Png(bytes) => bytes,
        ImageRef::Url(url) => generator.fetch(&url).await?,
    };

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&args.out, &bytes)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    let caption = CaptionComposer::new(args.caption_style).compose(request.age, &request.mood);
    println!("{caption}");
    eprintln!("Saved: {}", args.out.display());
    Ok(())
}
