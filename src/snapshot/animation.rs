//! Animated GIF assembly through ImageMagick.

use crate::capture::SnapshotConfig;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// What happened to the animation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationOutcome {
    Created(PathBuf),
    /// The tool could not be run or exited unsuccessfully.
    Failed(String),
    /// Nothing to animate.
    Skipped,
}

/// Invocation of `convert -delay <d> -loop <n> <frames...> <output>`.
#[derive(Debug, Clone)]
pub struct AnimationTool {
    program: String,
    delay: u32,
    loop_count: u32,
    output: PathBuf,
}

impl AnimationTool {
    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self {
            program: config.animation_program.clone(),
            delay: config.animation_delay,
            loop_count: config.animation_loop,
            output: config.animation_path.clone(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn command(&self, frames: &[PathBuf]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-delay")
            .arg(self.delay.to_string())
            .arg("-loop")
            .arg(self.loop_count.to_string())
            .args(frames)
            .arg(&self.output);
        command
    }

    /// Runs the tool once. Failures are logged and reported in the outcome,
    /// never returned as errors: the stills are already safely on disk.
    pub fn run(&self, frames: &[PathBuf]) -> AnimationOutcome {
        if frames.is_empty() {
            return AnimationOutcome::Skipped;
        }
        match self.command(frames).status() {
            Ok(status) if status.success() => {
                info!(path = %self.output.display(), "animation written");
                AnimationOutcome::Created(self.output.clone())
            }
            Ok(status) => {
                warn!("{} exited with {}", self.program, status);
                AnimationOutcome::Failed(format!("{} exited with {}", self.program, status))
            }
            Err(e) => {
                warn!("failed to run {}: {}", self.program, e);
                AnimationOutcome::Failed(e.to_string())
            }
        }
    }
}
