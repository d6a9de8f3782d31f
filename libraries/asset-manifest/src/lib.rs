//! Turns a directory of game assets into a generated, statically typed TypeScript manifest.
//!
//! The pipeline is [`scan`] → [`Manifest::build`] → [`emit`]. [`compile`] runs all of it
//! from scratch; nothing is cached between runs.

pub mod classify;
pub mod config;
mod emit;
mod error;
pub mod manifest;
mod scan;

pub use classify::AssetType;
pub use config::Config;
pub use emit::{emit, EmitOptions, LOADER_MODULE};
pub use error::ManifestError;
pub use manifest::Manifest;
pub use scan::scan;

use std::fs;

/// Scans the assets directory and renders the manifest module.
///
/// # Errors
///
/// Fails if the assets directory cannot be scanned.
pub fn compile(config: &Config) -> Result<Vec<u8>, ManifestError> {
    let files = scan(&config.assets_dir)?;
    let manifest = Manifest::build(&config.assets_dir, &files);

    let options = EmitOptions {
        source_name: &config.source_name,
        loader_module: LOADER_MODULE,
    };
    let mut out = Vec::new();
    emit(&mut out, &manifest, &options)?;

    Ok(out)
}

/// Runs [`compile`] and overwrites the configured output file with the result.
///
/// The module is rendered completely before the file is touched.
///
/// # Errors
///
/// Fails if the assets directory cannot be scanned or the output file cannot be written.
pub fn compile_to_file(config: &Config) -> Result<(), ManifestError> {
    let output = compile(config)?;
    fs::write(&config.output_file, output).map_err(|source| ManifestError::Write {
        path: config.output_file.clone(),
        source,
    })
}
