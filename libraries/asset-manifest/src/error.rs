use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that can abort a manifest build.
///
/// Problems with individual asset files are never reported through this type;
/// those files are skipped and logged instead.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    ReadConfig {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The config file is not valid JSON or lacks the `assets` section.
    #[error("failed to parse config file {}: {source}", path.display())]
    ParseConfig {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying parser error.
        source: serde_json::Error,
    },
    /// A directory below the assets root could not be listed.
    #[error("failed to scan assets directory {}: {source}", path.display())]
    Scan {
        /// The directory or entry that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Writing the generated module into memory failed.
    #[error("failed to render manifest: {0}")]
    Render(#[from] io::Error),
    /// The generated module could not be written to the output file.
    #[error("failed to write manifest to {}: {source}", path.display())]
    Write {
        /// Path of the output file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}
