//! Input path expansion for the CLI
//!
//! Turns user-supplied paths into a list of regular files, descending
//! into directories only when recursion is requested, and derives short
//! display names for the progress view.

use crate::error::{HashCalcError, IoResultExt, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expand one input path into the files it denotes
pub fn expand_path(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HashCalcError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(HashCalcError::io(path, e)),
    };

    if metadata.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !metadata.is_dir() {
        return Err(HashCalcError::NotFound(path.to_path_buf()));
    }

    if !recursive {
        return Err(HashCalcError::IsADirectory(path.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let at = e.path().unwrap_or(path).to_path_buf();
            match e.into_io_error() {
                Some(io) => HashCalcError::io(at, io),
                None => HashCalcError::config(format!("filesystem loop at {}", at.display())),
            }
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    tracing::debug!("Expanded {} into {} files", path.display(), files.len());
    Ok(files)
}

/// Expand a list of inputs, keeping their order
pub fn collect_files(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(expand_path(path, recursive)?);
    }
    Ok(files)
}

/// Make a path absolute relative to the current directory
pub fn to_absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().with_path(path)?;
    Ok(cwd.join(path))
}

/// Shortest distinguishing display name for each path
///
/// Paths are shown by file name; when several share a file name, the
/// shortest trailing component run that tells them apart is used, and
/// the full path as a last resort.
pub fn short_display_names(paths: &[PathBuf]) -> HashMap<PathBuf, String> {
    let mut names: Vec<String> = paths
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect();

    let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, name) in names.iter().enumerate() {
        by_name.entry(name.clone()).or_default().push(i);
    }

    for indices in by_name.values().filter(|v| v.len() > 1) {
        let max_depth = indices
            .iter()
            .map(|&i| paths[i].components().count())
            .max()
            .unwrap_or(1);

        let mut resolved = false;
        for depth in 2..=max_depth {
            let candidates: Vec<String> = indices
                .iter()
                .map(|&i| tail(&paths[i], depth))
                .collect();
            let mut unique = candidates.clone();
            unique.sort();
            unique.dedup();
            if unique.len() == candidates.len() {
                for (&i, candidate) in indices.iter().zip(candidates) {
                    names[i] = candidate;
                }
                resolved = true;
                break;
            }
        }

        if !resolved {
            for &i in indices {
                names[i] = paths[i].display().to_string();
            }
        }
    }

    paths.iter().cloned().zip(names).collect()
}

fn tail(path: &Path, depth: usize) -> String {
    let parts: Vec<_> = path.components().collect();
    let start = parts.len().saturating_sub(depth);
    parts[start..]
        .iter()
        .collect::<PathBuf>()
        .display()
        .to_string()
}
