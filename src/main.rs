use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use watermarker::config::Config;
use watermarker::decoder::{mime_type_for_path, ImageDecoder, SourceImage};
use watermarker::status::StatusTracker;
use watermarker::watermark::{composite_source, WatermarkCompositor, WatermarkTheme};

/// Watermarker - burn a legible text watermark into an image and save it as PNG
#[derive(Parser, Debug)]
#[command(name = "watermarker")]
#[command(version, about, long_about = None)]
struct Args {
    /// Image to watermark
    input: Option<PathBuf>,

    /// Watermark text (defaults to watermark.default_text from the config)
    #[arg(short, long)]
    text: Option<String>,

    /// Where to write the PNG (defaults to output.filename from the config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Style preset: contrast, classic, indigo or minimal
    #[arg(long)]
    theme: Option<WatermarkTheme>,

    /// Print a data URL to stdout instead of writing a file
    #[arg(long)]
    data_url: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(theme) = args.theme {
        config.watermark.theme = theme;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let config = load_config(&args)?;

    // Initialize logging subsystem
    watermarker::logging::init_with_config(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    tracing::info!(
        config_file = ?args.config.as_ref().map(|p| p.display().to_string()),
        theme = config.watermark.theme.as_str(),
        max_file_size = config.decoder.max_file_size,
        "Configuration loaded successfully"
    );

    if args.test {
        return Ok(());
    }

    let Some(input) = args.input.as_ref() else {
        bail!("No input image given");
    };

    let source = SourceImage::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    if mime_type_for_path(input).is_none() {
        tracing::warn!(path = %input.display(), "Unrecognized image extension");
    }

    let text = args
        .text
        .clone()
        .unwrap_or_else(|| config.watermark.default_text.clone());
    let style = config.style().context("Invalid watermark style")?;

    let decoder = ImageDecoder::with_limits(config.decoder.clone());
    let compositor = WatermarkCompositor::with_style(style);
    let status = StatusTracker::new();

    let ticket = status.begin();
    let result = composite_source(&decoder, &compositor, source, &text).await;
    status.finish(ticket, result.is_ok());
    tracing::debug!(
        status = status.status().as_str(),
        finished = status.is_finished(),
        "Request finished"
    );

    let image = result.with_context(|| format!("Could not watermark {}", input.display()))?;

    if args.data_url {
        println!("{}", image.to_data_url());
        return Ok(());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.filename));
    image
        .write_to(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        output = %output.display(),
        width = image.width,
        height = image.height,
        bytes = image.len(),
        "Watermarked image saved"
    );

    Ok(())
}
