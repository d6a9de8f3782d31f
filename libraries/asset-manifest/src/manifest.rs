//! The in-memory form of the generated manifest.

use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
};

use indexmap::IndexMap;
use log::warn;

use crate::classify::{classify, AssetType, Classification, FrameMatch};

/// A single file that is loaded on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetEntry {
    /// Key in the manifest: the path without its extension.
    pub name: String,
    /// Loader type of the file.
    pub typ: AssetType,
    /// Path relative to the assets directory.
    pub path: String,
}

/// Frames sharing a name prefix, keyed by their frame number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnimationBundle {
    frames: BTreeMap<u32, String>,
}

impl AnimationBundle {
    /// Frame paths in ascending frame order. Missing frame numbers are simply absent.
    pub fn frames(&self) -> impl Iterator<Item = &str> {
        self.frames.values().map(String::as_str)
    }

    /// Stores `path` as frame `index`, returning the path it replaced, if any.
    fn insert(&mut self, index: u32, path: String) -> Option<String> {
        self.frames.insert(index, path)
    }
}

/// Everything the generated module lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Single assets in scan order.
    pub assets: Vec<AssetEntry>,
    /// Animation bundles in the order their first frame was seen.
    pub animations: IndexMap<String, AnimationBundle>,
}

impl Manifest {
    /// Classifies each of `files` (relative to `root`) and collects the result.
    #[must_use]
    pub fn build(root: &Path, files: &[String]) -> Self {
        let mut manifest = Self::default();

        for path in files {
            match classify(root, path) {
                Classification::Frame(frame) => manifest.add_frame(frame, path.clone()),
                Classification::Asset(typ) => manifest.add_asset(typ, path.clone()),
                Classification::Excluded => {}
            }
        }

        manifest.warn_about_duplicate_names();
        manifest
    }

    /// Adds a single asset, named after its path without extension.
    pub fn add_asset(&mut self, typ: AssetType, path: String) {
        let name = match path.rsplit_once('.') {
            Some((stem, _extension)) => stem.to_owned(),
            None => path.clone(),
        };
        self.assets.push(AssetEntry { name, typ, path });
    }

    /// Adds a frame to its bundle. A later frame with the same number replaces the earlier one.
    pub fn add_frame(&mut self, frame: FrameMatch, path: String) {
        let FrameMatch { prefix, index } = frame;
        let replaced = self
            .animations
            .entry(prefix.clone())
            .or_default()
            .insert(index, path.clone());

        if let Some(replaced) = replaced {
            warn!("frame {index} of animation \"{prefix}\" is defined more than once, {replaced} is replaced by {path}");
        }
    }

    /// `true` if neither single assets nor animations were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.animations.is_empty()
    }

    /// Every path in the manifest: single assets first, then animation frames.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.assets
            .iter()
            .map(|asset| asset.path.as_str())
            .chain(self.animations.values().flat_map(|bundle| bundle.frames()))
    }

    fn warn_about_duplicate_names(&self) {
        let mut seen = HashSet::new();
        let names = self
            .assets
            .iter()
            .map(|asset| asset.name.as_str())
            .chain(self.animations.keys().map(String::as_str));

        for name in names {
            if !seen.insert(name) {
                warn!("asset name \"{name}\" is used more than once, only the last entry will be reachable");
            }
        }
    }
}
