//! Output directory and frame naming.

use super::OutputConfig;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("output path {0} exists and is not a directory")]
    NotADirectory(PathBuf),
}

/// A directory that numbered frames are written into.
///
/// Frames from an earlier run with the same names are overwritten.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
    prefix: String,
    extension: String,
}

impl OutputDir {
    /// Creates the configured directory (and parents) if missing, reusing it
    /// otherwise.
    pub fn ensure(config: &OutputConfig) -> Result<Self, OutputError> {
        let root = config.directory.clone();
        if root.exists() && !root.is_dir() {
            return Err(OutputError::NotADirectory(root));
        }
        if !root.is_dir() {
            std::fs::create_dir_all(&root).map_err(|source| OutputError::Create {
                path: root.clone(),
                source,
            })?;
            tracing::info!(path = %root.display(), "created output directory");
        }
        Ok(Self {
            root,
            prefix: config.prefix.clone(),
            extension: config.extension.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of frame `counter`: `<root>/<prefix><counter:04>.<extension>`.
    pub fn frame_path(&self, counter: u64) -> PathBuf {
        self.root
            .join(format!("{}{:04}.{}", self.prefix, counter, self.extension))
    }
}
