// src/main.rs
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gesture_remote::classifier::GestureClassifier;
use gesture_remote::config::{ControllerConfig, Profile};
use gesture_remote::sink::LoggingSink;
use gesture_remote::source::CsvLandmarkSource;
use gesture_remote::{LinearModel, Pipeline};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gesture-remote")]
#[command(about = "Hand-gesture media remote control")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Drive the controller from a recorded landmark CSV
    Replay(ReplayArgs),
    /// Load a model artifact and describe it
    InspectModel(ModelArgs),
    /// Print the effective controller configuration
    ShowConfig(ConfigArgs),
}

#[derive(Debug, Args)]
struct ModelArgs {
    #[arg(long, default_value = "gesture_model.json")]
    model: PathBuf,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Profile::Player)]
    profile: Profile,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    #[arg(long)]
    landmarks: PathBuf,
    #[command(flatten)]
    model: ModelArgs,
    #[command(flatten)]
    config: ConfigArgs,
    /// Capture rate the recording is replayed at
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
    /// Stop after this many frames instead of at the end of the recording
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Replay(args) => replay(args),
        Commands::InspectModel(args) => inspect_model(&args.model),
        Commands::ShowConfig(args) => show_config(&args),
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn load_model(path: &Path) -> Result<LinearModel> {
    LinearModel::load(path).context("could not load gesture model, train and export it first")
}

fn load_config(args: &ConfigArgs) -> Result<ControllerConfig> {
    ControllerConfig::resolve(args.config.as_deref(), args.profile)
        .context("could not load controller configuration")
}

fn replay(args: ReplayArgs) -> Result<()> {
    anyhow::ensure!(
        args.fps.is_finite() && args.fps > 0.0,
        "--fps must be a positive number"
    );
    let model = load_model(&args.model.model)?;
    let config = load_config(&args.config)?;
    let source = CsvLandmarkSource::open(&args.landmarks)?;

    info!(
        profile = ?args.config.profile,
        frame_skip = config.frame_skip,
        "replaying {}",
        args.landmarks.display()
    );

    // no interrupt source during replay; --max-frames raises the flag
    let shutdown = AtomicBool::new(args.max_frames == Some(0));
    let frame_interval = Duration::from_secs_f64(1.0 / args.fps);
    let start = Instant::now();
    let mut elapsed = Duration::ZERO;
    let mut frames = 0;
    let clock = || {
        frames += 1;
        if args.max_frames.is_some_and(|max| frames >= max) {
            shutdown.store(true, Ordering::Relaxed);
        }
        elapsed += frame_interval;
        start + elapsed
    };

    let mut pipeline = Pipeline::new(source, model, LoggingSink::new(), &config);
    let summary = pipeline.run(clock, &shutdown)?;

    if let Some(accuracy) = summary.stable_accuracy() {
        info!("stable gestures matching labels: {:.1}%", accuracy * 100.0);
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn inspect_model(path: &Path) -> Result<()> {
    let model = load_model(path)?;
    println!("model: {}", path.display());
    println!("features: {}", gesture_remote::landmarks::FEATURE_LEN);
    for label in model.labels() {
        println!("  {} {}", label.code(), label);
    }
    Ok(())
}

fn show_config(args: &ConfigArgs) -> Result<()> {
    let config = load_config(args)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
