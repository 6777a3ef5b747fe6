//! Raspberry Pi Time-Lapse CLI
//!
//! Records stills at a fixed interval derived from how long to capture and
//! how long the resulting movie should be, optionally starting at a given
//! wall-clock time.

use chrono::Local;
use clap::Parser;
use pi_timelapse::{
    capture::{Camera, ConfigError, FileConfig, MockCamera, StillCamera, TimelapseSession},
    metrics::MetricsRegistry,
    start::{StartGate, StartTimeArgs},
    timing::{install_ctrlc_handler, SystemClock},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "pi-timelapse",
    version,
    about = "Time for time-lapse!",
    long_about = "Time for time-lapse! To start recording at a certain time, pass in any or \
                  all of the time related args. If no time-related args are passed in, \
                  recording will start immediately."
)]
struct Cli {
    /// How long to record, in HOURS [default: 1.0]
    #[arg(short = 'c', long = "capture-time", alias = "captureTime", value_name = "HOURS")]
    capture_time: Option<f64>,

    /// Length of the final movie, in SECONDS [default: 60]
    #[arg(short = 'd', long, value_name = "SECONDS")]
    duration: Option<u32>,

    /// Frames per second of the final movie [default: 30]
    #[arg(short = 'f', long = "fps", alias = "framesPerSecond")]
    fps: Option<u32>,

    /// Horizontal resolution of each still [default: 1280]
    #[arg(short = 'x', long = "xres", alias = "Xresolution")]
    xres: Option<u32>,

    /// Vertical resolution of each still [default: 720]
    #[arg(short = 'y', long = "yres", alias = "Yresolution")]
    yres: Option<u32>,

    /// JPEG quality from 1-100 [default: 85]
    #[arg(short = 'q', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Year to start recording
    #[arg(long)]
    year: Option<i32>,

    /// Month to start recording
    #[arg(long)]
    month: Option<u32>,

    /// Day to start recording
    #[arg(long)]
    day: Option<u32>,

    /// Hour to start recording
    #[arg(long)]
    hour: Option<u32>,

    /// Minute to start recording [default: 0 when any time arg is given]
    #[arg(long)]
    minute: Option<u32>,

    /// Second to start recording [default: 0 when any time arg is given]
    #[arg(long)]
    second: Option<u32>,

    /// Directory the stills are written to [default: time-lapse]
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use a mock camera instead of the Pi camera
    #[arg(long)]
    dry_run: bool,

    /// Serve Prometheus metrics on this port (needs the `metrics` feature)
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl Cli {
    fn start_time_args(&self) -> StartTimeArgs {
        StartTimeArgs {
            year: self.year,
            month: self.month,
            day: self.day,
            hour: self.hour,
            minute: self.minute,
            second: self.second,
        }
    }

    /// File configuration (or defaults) with command-line overrides applied.
    fn load_config(&self) -> Result<FileConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        if let Some(hours) = self.capture_time {
            config.schedule.capture_hours = hours;
        }
        if let Some(seconds) = self.duration {
            config.schedule.movie_seconds = seconds;
        }
        if let Some(fps) = self.fps {
            config.schedule.framerate = fps;
        }
        if let Some(width) = self.xres {
            config.camera.width = width;
        }
        if let Some(height) = self.yres {
            config.camera.height = height;
        }
        if let Some(quality) = self.quality {
            config.camera.quality = quality;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
        }
        // Time args replace the file's start time as a whole.
        let cli_start = self.start_time_args();
        if !cli_start.is_empty() {
            config.start = cli_start;
        }

        config.camera.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "metrics")]
fn serve_metrics(port: u16, registry: &Arc<MetricsRegistry>) {
    use pi_timelapse::metrics::{MetricsServer, MetricsServerConfig};

    MetricsServer::new(MetricsServerConfig::with_port(port), Arc::clone(registry)).spawn();
}

#[cfg(not(feature = "metrics"))]
fn serve_metrics(port: u16, _registry: &Arc<MetricsRegistry>) {
    warn!(
        "Built without the `metrics` feature, not serving metrics on port {}",
        port
    );
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
    info!("pi-timelapse v{}", pi_timelapse::VERSION);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Everything that can be rejected is rejected before the camera is touched.
    let schedule = match config.schedule.compute() {
        Ok(schedule) => schedule,
        Err(e) => {
            error!("Invalid schedule: {}", e);
            std::process::exit(1);
        }
    };
    let start_time = match config.start.resolve(Local::now().naive_local()) {
        Ok(start_time) => start_time,
        Err(e) => {
            error!("Invalid start time: {}", e);
            std::process::exit(1);
        }
    };

    let cancel = match install_ctrlc_handler() {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to install interrupt handler: {}", e);
            std::process::exit(1);
        }
    };

    let metrics = match MetricsRegistry::new() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };
    if config.metrics.port != 0 {
        serve_metrics(config.metrics.port, &metrics);
    }

    let mut camera: Box<dyn Camera> = if cli.dry_run {
        warn!("Dry run: using a mock camera");
        Box::new(MockCamera::new())
    } else {
        Box::new(StillCamera::new())
    };

    let mut session = TimelapseSession::new(schedule, config.camera, config.output)
        .with_start_gate(StartGate::new(start_time))
        .with_metrics(metrics);

    match session.run(&mut camera, &SystemClock::new(), &cancel) {
        Ok(report) if report.is_complete() => {
            info!(
                frames = report.frames_captured,
                elapsed_secs = report.elapsed.as_secs(),
                "Done"
            );
        }
        Ok(report) => {
            info!(
                frames = report.frames_captured,
                "Stopped early at the user's request"
            );
        }
        Err(e) => {
            error!("Capture failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "pi-timelapse",
            "--capture-time",
            "2.5",
            "-d",
            "30",
            "--fps",
            "24",
            "-x",
            "1920",
            "-y",
            "1080",
            "-q",
            "90",
            "--hour",
            "6",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.schedule.capture_hours, 2.5);
        assert_eq!(config.schedule.movie_seconds, 30);
        assert_eq!(config.schedule.framerate, 24);
        assert_eq!(config.camera.width, 1920);
        assert_eq!(config.camera.height, 1080);
        assert_eq!(config.camera.quality, 90);
        assert_eq!(config.start.hour, Some(6));
        assert_eq!(config.start.minute, None);
    }

    #[test]
    fn test_legacy_aliases() {
        let cli = Cli::parse_from(["pi-timelapse", "--captureTime", "0.5", "--framesPerSecond", "25"]);
        assert_eq!(cli.capture_time, Some(0.5));
        assert_eq!(cli.fps, Some(25));
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["pi-timelapse", "-q", "101"]).is_err());
    }

    #[test]
    fn test_defaults_without_args() {
        let config = Cli::parse_from(["pi-timelapse"]).load_config().unwrap();
        let schedule = config.schedule.compute().unwrap();
        assert_eq!(schedule.interval(), 2.0);
        assert!(config.start.is_empty());
    }
}
