//! Loading of the `assets` section of the game's config file.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::ManifestError;

/// Debounce window used when the config file does not specify `debounceMs`.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Deserialize)]
struct ConfigFile {
    assets: AssetsSection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetsSection {
    assets_path: PathBuf,
    compiled_assets_file: PathBuf,
    #[serde(default = "default_debounce_ms")]
    debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

/// Resolved settings of the asset compiler.
///
/// All paths have already been resolved against the directory containing the config file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// File name of the config file, mentioned in the header of the generated file.
    pub source_name: String,
    /// Root of the directory tree that gets scanned.
    pub assets_dir: PathBuf,
    /// Path of the generated TypeScript module.
    pub output_file: PathBuf,
    /// Quiet period after the last filesystem change before a rebuild starts.
    pub debounce: Duration,
}

impl Config {
    /// Reads and resolves the config file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not contain a valid `assets` section.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ManifestError::ReadConfig {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&json, path).map_err(|source| ManifestError::ParseConfig {
            path: path.to_owned(),
            source,
        })
    }

    /// Parses `json` as if it had been read from `config_path`.
    ///
    /// # Errors
    ///
    /// Fails if `json` is malformed or lacks one of the required keys.
    pub fn from_json(json: &str, config_path: &Path) -> Result<Self, serde_json::Error> {
        let ConfigFile {
            assets:
                AssetsSection {
                    assets_path,
                    compiled_assets_file,
                    debounce_ms,
                },
        } = serde_json::from_str(json)?;

        let config_dir = config_path.parent().unwrap_or_else(|| Path::new(""));
        let source_name = config_path.file_name().map_or_else(
            || config_path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );

        Ok(Self {
            source_name,
            assets_dir: config_dir.join(assets_path),
            output_file: config_dir.join(compiled_assets_file),
            debounce: Duration::from_millis(debounce_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_paths_relative_to_config_file() {
        let json = r#"{
            "assets": {
                "assetsPath": "../assets",
                "compiledAssetsFile": "../src/game/assets.ts"
            },
            "window": { "width": 800 }
        }"#;
        let config = Config::from_json(json, Path::new("project/config/config.json")).unwrap();

        assert_eq!(config.source_name, "config.json");
        assert_eq!(config.assets_dir, Path::new("project/config/../assets"));
        assert_eq!(
            config.output_file,
            Path::new("project/config/../src/game/assets.ts")
        );
        assert_eq!(config.debounce, Duration::from_millis(DEFAULT_DEBOUNCE_MS));
    }

    #[test]
    fn bare_file_name_resolves_to_current_directory() {
        let json = r#"{ "assets": { "assetsPath": "assets", "compiledAssetsFile": "out.ts", "debounceMs": 250 } }"#;
        let config = Config::from_json(json, Path::new("config.json")).unwrap();

        assert_eq!(config.assets_dir, Path::new("assets"));
        assert_eq!(config.output_file, Path::new("out.ts"));
        assert_eq!(config.debounce, Duration::from_millis(250));
    }

    #[test]
    fn missing_assets_section_is_rejected() {
        let result = Config::from_json(r#"{ "window": {} }"#, Path::new("config.json"));
        assert!(result.is_err(), "config without `assets` must not parse");
    }

    #[test]
    fn missing_config_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = Config::load(dir.path().join("nope.json")).unwrap_err();
        assert!(
            matches!(error, ManifestError::ReadConfig { .. }),
            "unexpected error: {error}"
        );
    }
}
