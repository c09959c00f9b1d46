use anyhow::{Context, Result};
use imgsize_common::{has_supported_extension, Error};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resolve positional arguments and an optional directory into image files.
///
/// Arguments keep their order; directory results are sorted and appended.
pub fn collect_files(args: &[String], dir: Option<&Path>, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for arg in args {
        if is_pattern(arg) {
            files.extend(expand_pattern(arg)?);
            continue;
        }

        let path = PathBuf::from(arg);
        if path.is_file() {
            files.push(path);
        } else if path.is_dir() {
            tracing::warn!("Skipping directory {} (use --dir)", path.display());
        } else {
            tracing::warn!("Skipping {}: no such file", path.display());
        }
    }

    if let Some(dir) = dir {
        files.extend(walk_dir(dir, recursive)?);
    }

    Ok(files)
}

fn is_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))?;

    let mut matches = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    matches.push(path);
                }
            }
            Err(e) => tracing::warn!("Glob error: {}", e),
        }
    }

    if matches.is_empty() {
        tracing::warn!("No files matched pattern: {}", pattern);
    } else {
        tracing::debug!("Found {} files matching {}", matches.len(), pattern);
    }
    Ok(matches)
}

/// Supported image files under `dir`, top level only unless `recursive`
pub fn walk_dir(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound(dir.to_path_buf()).into());
    }

    let mut walker = WalkDir::new(dir).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() && has_supported_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    tracing::debug!("Collected {} images from {}", files.len(), dir.display());
    Ok(files)
}
