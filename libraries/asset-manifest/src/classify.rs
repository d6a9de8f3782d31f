//! Decides what kind of asset a file is, based on its name and, for JSON files, its content.

use std::{fmt, fs, path::Path};

use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

/// Every kind of asset the generated loader knows how to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetType {
    /// A single `.png` or `.gif`.
    Image,
    /// A Tiled map export.
    TileMap,
    /// A Tiled world export, referencing several maps.
    TileWorld,
    /// An `.mp3` file.
    Audio,
    /// Known to the loader, never produced by the scanner.
    Spritesheet,
    /// A bundle of numbered frames.
    Animation,
}

impl AssetType {
    /// Every variant, in the order of the generated `AssetType` union.
    pub const ALL: [Self; 6] = [
        Self::Image,
        Self::TileMap,
        Self::TileWorld,
        Self::Audio,
        Self::Spritesheet,
        Self::Animation,
    ];

    /// Name of the type as it appears in the generated `AssetType` union.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::TileMap => "TileMap",
            Self::TileWorld => "TileWorld",
            Self::Audio => "Audio",
            Self::Spritesheet => "Spritesheet",
            Self::Animation => "Animation",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// A file that is one frame of an animation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameMatch {
    /// Everything in front of the frame number, including sub directories.
    pub prefix: String,
    /// The frame number.
    pub index: u32,
}

/// A named rule that recognizes animation frames by their file name.
#[derive(Clone, Copy)]
pub struct FrameMatcher {
    /// Short name of the naming convention, for diagnostics.
    pub name: &'static str,
    matches: fn(&str) -> Option<FrameMatch>,
}

impl FrameMatcher {
    /// Returns the frame `path` describes under this convention, if any.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<FrameMatch> {
        (self.matches)(path)
    }
}

impl fmt::Debug for FrameMatcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FrameMatcher")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Frame naming conventions in priority order; the first match wins.
pub const FRAME_MATCHERS: [FrameMatcher; 2] = [
    // `walk_12.png`
    FrameMatcher {
        name: "underscore",
        matches: underscore_frame,
    },
    // `walk (12).png`, as produced by most sprite exporters
    FrameMatcher {
        name: "parenthesized",
        matches: parenthesized_frame,
    },
];

/// Runs all [`FRAME_MATCHERS`] against `path`.
#[must_use]
pub fn match_frame(path: &str) -> Option<FrameMatch> {
    FRAME_MATCHERS.iter().find_map(|matcher| matcher.matches(path))
}

fn strip_image_extension(path: &str) -> Option<&str> {
    path.strip_suffix(".png").or_else(|| path.strip_suffix(".gif"))
}

fn underscore_frame(path: &str) -> Option<FrameMatch> {
    let stem = strip_image_extension(path)?;
    let (prefix, digits) = stem.rsplit_once('_')?;
    frame(prefix, digits)
}

fn parenthesized_frame(path: &str) -> Option<FrameMatch> {
    let stem = strip_image_extension(path)?.strip_suffix(')')?;
    let (prefix, digits) = stem.rsplit_once(" (")?;
    frame(prefix, digits)
}

fn frame(prefix: &str, digits: &str) -> Option<FrameMatch> {
    if prefix.is_empty() || digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    // absurdly large frame numbers are treated as part of an ordinary image name
    let index = digits.parse().ok()?;

    Some(FrameMatch {
        prefix: prefix.to_owned(),
        index,
    })
}

/// The two JSON shapes exported by the Tiled map editor that the loader understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TiledKind {
    /// `"type": "map"`
    Map,
    /// `"type": "world"`
    World,
}

impl From<TiledKind> for AssetType {
    fn from(kind: TiledKind) -> Self {
        match kind {
            TiledKind::Map => Self::TileMap,
            TiledKind::World => Self::TileWorld,
        }
    }
}

/// Why a JSON file was not recognized as a Tiled export.
#[derive(Debug, Error)]
pub enum SniffError {
    /// The file is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Valid JSON, but some other document.
    #[error("neither a Tiled map nor a Tiled world")]
    UnknownShape,
}

/// Parses `contents` and checks whether it is a Tiled map or world.
///
/// # Errors
///
/// Returns [`SniffError::Json`] for malformed JSON and [`SniffError::UnknownShape`] for
/// any other JSON document, including anything that is not an object.
pub fn sniff_tiled(contents: &str) -> Result<TiledKind, SniffError> {
    let value: Value = serde_json::from_str(contents)?;
    let object = value.as_object().ok_or(SniffError::UnknownShape)?;

    match object.get("type").and_then(Value::as_str) {
        Some("map") if is_truthy(object.get("version")) && is_truthy(object.get("tilewidth")) => {
            Ok(TiledKind::Map)
        }
        Some("world") if is_truthy(object.get("maps")) => Ok(TiledKind::World),
        _ => Err(SniffError::UnknownShape),
    }
}

/// Tiled writes `0`, `""` or `null` for unset values, so those count as absent.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(&Value::Bool(flag)) => flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|value| value != 0.0),
        Some(Value::String(string)) => !string.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Outcome of classifying a single file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Part of an animation bundle.
    Frame(FrameMatch),
    /// A single asset of the given type.
    Asset(AssetType),
    /// Not part of the manifest.
    Excluded,
}

/// Classifies the file at `path`, relative to `root`.
///
/// JSON files are read from disk; files that cannot be read or parsed are excluded.
#[must_use]
pub fn classify(root: &Path, path: &str) -> Classification {
    if let Some(frame) = match_frame(path) {
        return Classification::Frame(frame);
    }

    if path.ends_with(".png") || path.ends_with(".gif") {
        Classification::Asset(AssetType::Image)
    } else if path.ends_with(".mp3") {
        Classification::Asset(AssetType::Audio)
    } else if path.ends_with(".json") {
        classify_json(&root.join(path), path)
    } else {
        Classification::Excluded
    }
}

fn classify_json(full_path: &Path, path: &str) -> Classification {
    let contents = match fs::read_to_string(full_path) {
        Ok(contents) => contents,
        Err(error) => {
            warn!("skipping {path}: failed to read file: {error}");
            return Classification::Excluded;
        }
    };

    match sniff_tiled(&contents) {
        Ok(kind) => Classification::Asset(kind.into()),
        Err(error) => {
            debug!("skipping {path}: {error}");
            Classification::Excluded
        }
    }
}
