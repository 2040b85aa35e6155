//! TCView CLI
//!
//! Play a cell position file, or generate a synthetic one.

use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tcview_core::{Player, ViewerConfig};
use tcview_env::{FrameCapture, HeadlessScene, ImageFormat, RenderGateway};
use tcview_player::{
    generate, play_file, GeneratorConfig, PlayOptions, PlaybackExport, PlayerError, RerunGateway,
};
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// TCView immune-cell playback
#[derive(Parser, Debug)]
#[command(name = "tcview")]
#[command(about = "Play back agent-based immune simulation position files", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a position file
    Play(PlayArgs),

    /// Write a synthetic position file
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Position file to play
    file: PathBuf,

    /// Viewer configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Milliseconds between frames
    #[arg(short, long, default_value = "100")]
    interval_ms: u64,

    /// Capture every frame to <BASENAME><frame:05d>.<ext>
    #[arg(short, long, value_name = "BASENAME")]
    save: Option<String>,

    /// Save an image of the final frame (png, jpg, tif or bmp by extension)
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Export per-frame summaries to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Stream the scene to a Rerun viewer
    #[arg(long)]
    rerun: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Master seed
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of frames
    #[arg(short, long, default_value = "100")]
    frames: u64,

    /// T cells present in the first frame
    #[arg(long, default_value = "40")]
    tcells: usize,

    /// Dendritic cells
    #[arg(long, default_value = "5")]
    dcells: usize,

    /// Output file
    #[arg(short, long, default_value = "cells.pos")]
    output: PathBuf,
}

fn snapshot_format(path: &Path) -> Result<ImageFormat, PlayerError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| PlayerError::Argument(format!("{} has no image extension", path.display())))?
        .parse::<ImageFormat>()
        .map_err(PlayerError::Argument)
}

async fn play_with<G: RenderGateway + FrameCapture>(
    gateway: G,
    config: ViewerConfig,
    args: &PlayArgs,
) -> Result<(), PlayerError> {
    let snapshot = match &args.snapshot {
        Some(path) => Some((path.clone(), snapshot_format(path)?)),
        None => None,
    };
    let options = PlayOptions {
        interval: Duration::from_millis(args.interval_ms.max(1)),
        save: args.save.clone(),
        snapshot,
    };

    let mut export = args
        .export
        .as_ref()
        .map(|_| PlaybackExport::new(&args.file.display().to_string()));

    let mut player = Player::new(gateway, config);
    let report = play_file(&mut player, &args.file, &options, export.as_mut()).await?;

    if let (Some(export), Some(path)) = (&export, &args.export) {
        export.write_to_file(path)?;
        info!("Exported {} frames to {}", export.frames.len(), path.display());
    }

    info!(
        "Done: {} frames rendered, {} skipped",
        report.frames_rendered, report.frames_skipped
    );
    Ok(())
}

fn run_play(args: PlayArgs) -> Result<(), PlayerError> {
    let config = match &args.config {
        Some(path) => ViewerConfig::from_json_file(path)?,
        None => ViewerConfig::default(),
    };
    let (width, height) = (config.capture_width, config.capture_height);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async {
        if args.rerun {
            play_with(RerunGateway::new("tcview", width, height), config, &args).await
        } else {
            play_with(HeadlessScene::new(width, height), config, &args).await
        }
    })
}

fn run_generate(args: GenerateArgs) -> Result<(), PlayerError> {
    let config = GeneratorConfig {
        seed: args.seed,
        frames: args.frames,
        initial_tcells: args.tcells,
        dcells: args.dcells,
        ..GeneratorConfig::default()
    };

    let mut out = BufWriter::new(File::create(&args.output)?);
    let summary = generate(config, &mut out)?;
    info!(
        "Wrote {} frames ({} T cells, {} bonds) to {}",
        summary.frames,
        summary.distinct_tcells,
        summary.bonds,
        args.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = if cli.verbose {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    info!("TCView v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Command::Play(args) => run_play(args),
        Command::Generate(args) => run_generate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
