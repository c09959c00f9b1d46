use crate::{Error, Result};
use std::path::Path;

/// File extensions picked up when walking a directory
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "heif", "heic", "avif"];

/// Validate input path exists and is a regular file
pub fn validate_input(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(Error::InvalidPath(path.to_path_buf()));
    }

    Ok(())
}

/// Case-insensitive check against [`SUPPORTED_EXTENSIONS`]
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
