use image::{DynamicImage, ImageReader};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Decode a still image from disk.
///
/// Unsupported extensions and unreadable files yield `None`; the pipeline
/// reports those as invalid images.
pub fn load_media(path: &Path) -> Option<DynamicImage> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        warn!("Extension of image path is not recognized: {}", path.display());
        return None;
    }

    let decoded = ImageReader::open(path)
        .map_err(anyhow::Error::from)
        .and_then(|reader| reader.decode().map_err(anyhow::Error::from));

    match decoded {
        Ok(img) => Some(img),
        Err(e) => {
            warn!("Failed to decode {}: {}", path.display(), e);
            None
        }
    }
}

/// File stems for debug dumps and cleaned outputs, one per input.
///
/// Inputs from different directories can share a stem (`a/x.png`,
/// `b/x.jpg`); later ones get a `_2`, `_3`, ... suffix so their files do
/// not overwrite each other.
pub fn output_stems(paths: &[PathBuf]) -> Vec<String> {
    let mut taken = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());

            let mut candidate = stem.clone();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{}_{}", stem, n);
                n += 1;
            }
            candidate
        })
        .collect()
}
