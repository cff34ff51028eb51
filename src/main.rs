use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};

use lecture_compositor::{
    composition::CompositionEngine,
    config::Config,
    render::JsonPlanSink,
};

#[derive(Parser)]
#[command(
    name = "lecture-compositor",
    version,
    about = "Plan a beat-synchronized slide video from a lecture recording",
    long_about = "Lecture-Compositor analyzes a lecture audio track, classifies the slide \
images by visual character, and plans a synchronized slideshow with zoom and fade effects \
matched to the audio's energy contour. The plan is written as JSON for the downstream encoder."
)]
struct Cli {
    /// Audio file path (WAV, MP3, FLAC)
    #[arg(short, long)]
    audio: PathBuf,

    /// Directory containing slide images (jpg, jpeg, png)
    #[arg(short, long)]
    slides: PathBuf,

    /// Output plan file path
    #[arg(short, long, default_value = "plan.json")]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Selection seed for reproducible plans
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Lecture-Compositor v{}", env!("CARGO_PKG_VERSION"));
    info!("Audio: {:?}", cli.audio);
    info!("Slides: {:?}", cli.slides);
    info!("Output: {:?}", cli.output);

    // Load configuration
    let mut config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    if let Some(seed) = cli.seed {
        config.planner.random_seed = Some(seed);
    }

    let engine = CompositionEngine::new(config);

    info!("Starting planning process...");
    engine
        .compose(&cli.audio, &cli.slides, &cli.output, &JsonPlanSink::new())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    info!("Plan complete! Output saved to: {:?}", cli.output);
    Ok(())
}
