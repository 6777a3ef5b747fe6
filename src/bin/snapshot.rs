//! Quick snapshot CLI
//!
//! Takes a short burst of stills and stitches them into an animated GIF with
//! ImageMagick.

use clap::Parser;
use pi_timelapse::{
    capture::{Camera, FileConfig, MockCamera, StillCamera},
    snapshot::{AnimationOutcome, Snapshot},
    timing::install_ctrlc_handler,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "pi-snapshot", version, about = "Capture a few stills and animate them")]
struct Cli {
    /// Number of stills to capture [default: 10]
    #[arg(short = 'n', long)]
    count: Option<u32>,

    /// Directory the stills are written to [default: images]
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Skip building the animated GIF
    #[arg(long)]
    no_animation: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use a mock camera instead of the Pi camera
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid configuration: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(count) = cli.count {
        config.snapshot.count = count;
    }
    if let Some(dir) = cli.output_dir {
        config.snapshot.output.directory = dir;
    }
    if cli.no_animation {
        config.snapshot.animate = false;
    }

    let cancel = match install_ctrlc_handler() {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to install interrupt handler: {}", e);
            std::process::exit(1);
        }
    };

    let mut camera: Box<dyn Camera> = if cli.dry_run {
        warn!("Dry run: using a mock camera");
        Box::new(MockCamera::new())
    } else {
        Box::new(StillCamera::new())
    };

    let snapshot = Snapshot::new(config.snapshot, config.camera);
    match snapshot.run(&mut camera, &cancel) {
        Ok(report) => match report.animation {
            Some(AnimationOutcome::Created(path)) => {
                info!("{} frames animated into {}", report.frames.len(), path.display())
            }
            Some(AnimationOutcome::Failed(reason)) => {
                warn!("Frames kept, animation failed: {}", reason)
            }
            _ => info!("{} frames captured", report.frames.len()),
        },
        Err(e) => {
            error!("Snapshot failed: {}", e);
            std::process::exit(1);
        }
    }
}
