//! Utility functions and constants
//!
//! **Used by**: Player (folder init), CLI

/// Media file type detection and folder scanning
pub mod media {
    use log::{debug, warn};
    use std::path::{Path, PathBuf};

    use crate::error::{Result, SequenceError};

    /// Supported image file extensions (case-sensitive)
    pub const IMAGE_EXTS: &[&str] = &["jpeg", "jpg", "png", "tga", "bmp", "gif"];

    /// Longer extensions are rejected outright
    pub const MAX_EXT_LEN: usize = 4;

    /// Extension of `file_name` if it is a supported image.
    ///
    /// Takes everything after the last dot, so `.png` counts as a png.
    pub fn image_extension(file_name: &str) -> Option<&str> {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            warn!("Missing extension for file: {}", file_name);
            return None;
        };
        if ext.len() > MAX_EXT_LEN {
            warn!("Invalid extension for file: {}", file_name);
            return None;
        }
        IMAGE_EXTS.contains(&ext).then_some(ext)
    }

    /// Check if file is a supported image format
    pub fn is_image(path: &Path) -> bool {
        path.file_name()
            .and_then(|s| s.to_str())
            .and_then(image_extension)
            .is_some()
    }

    /// List the supported images in `dir`, sorted by path.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if `dir` does not exist or is not a directory
    /// - `Io` if the directory cannot be read
    pub fn scan_folder(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(SequenceError::InvalidPath(dir.to_path_buf()));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if is_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        debug!("Found {} images in {}", paths.len(), dir.display());
        Ok(paths)
    }

    /// Display name for a sequence loaded from `dir`
    pub fn folder_name(dir: &Path) -> String {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string())
    }

}
