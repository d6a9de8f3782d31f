use std::{fs, path::Path};

use log::warn;

use crate::ManifestError;

/// Lists every file below `root`, at any depth, relative to `root`.
///
/// Paths always use `/` as separator. Directory entries are visited in sorted order
/// so repeated scans of an unchanged tree yield the same sequence. Entries whose names
/// are not valid UTF-8 cannot be referenced from the manifest and are skipped.
///
/// # Errors
///
/// Fails if `root` or one of its sub directories cannot be read.
pub fn scan(root: &Path) -> Result<Vec<String>, ManifestError> {
    let mut files = Vec::new();
    walk(root, None, &mut files)?;
    Ok(files)
}

fn walk(dir: &Path, prefix: Option<&str>, files: &mut Vec<String>) -> Result<(), ManifestError> {
    let scan_error = |source| ManifestError::Scan {
        path: dir.to_owned(),
        source,
    };

    let mut names = fs::read_dir(dir)
        .map_err(scan_error)?
        .map(|entry| entry.map(|entry| entry.file_name()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(scan_error)?;
    names.sort();

    for name in names {
        let path = dir.join(&name);
        let Some(name) = name.to_str() else {
            warn!("skipping {}: file name is not valid UTF-8", path.display());
            continue;
        };
        let relative = match prefix {
            Some(prefix) => format!("{prefix}/{name}"),
            None => name.to_owned(),
        };

        // follows symlinks, so a linked directory is scanned like a real one
        let metadata = fs::metadata(&path).map_err(|source| ManifestError::Scan {
            path: path.clone(),
            source,
        })?;

        if metadata.is_dir() {
            walk(&path, Some(&relative), files)?;
        } else {
            files.push(relative);
        }
    }

    Ok(())
}
