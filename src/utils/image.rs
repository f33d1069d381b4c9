//! Image loading and request-scoped image resolution.
//!
//! The pipeline refers to images by opaque `file_id`s. An [`ImageSource`]
//! turns such an id into a decoded RGB raster; [`FileImageSource`] is the
//! file-backed implementation, resolving ids against a root directory
//! with or without their extension.

use crate::core::{OcrError, OcrResult};
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions probed when resolving a bare file id.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff", "gif"];

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RGB.
///
/// # Arguments
///
/// * `path` - The path of the image file to load
///
/// # Returns
///
/// * `Ok(RgbImage)` - The loaded and converted RGB image
/// * `Err(OcrError::ImageLoad)` - If the image could not be opened or
///   decoded
pub fn load_image(path: &Path) -> OcrResult<RgbImage> {
    let img = image::open(path).map_err(OcrError::ImageLoad)?;
    let rgb = dynamic_to_rgb(img);
    debug!(path = %path.display(), width = rgb.width(), height = rgb.height(), "image opened");
    Ok(rgb)
}

/// Resolves a request-scoped identifier to a decoded RGB raster.
///
/// Absence is reported as [`OcrError::NotFound`].
pub trait ImageSource: Send + Sync {
    /// Resolves and decodes the image behind `file_id`.
    fn resolve(&self, file_id: &str) -> OcrResult<RgbImage>;
}

/// File-backed image source rooted at a directory.
pub struct FileImageSource {
    root: PathBuf,
}

impl FileImageSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves `file_id` to an existing path: the verbatim name first,
    /// then known image extensions, then any `<file_id>.*` entry that is
    /// not a JSON sidecar.
    pub fn resolve_path(&self, file_id: &str) -> Option<PathBuf> {
        let direct = self.root.join(file_id);
        if direct.exists() {
            return Some(direct);
        }
        for ext in IMAGE_EXTENSIONS {
            let candidate = self.root.join(format!("{file_id}.{ext}"));
            if candidate.exists() {
                return Some(candidate);
            }
        }
        let prefix = format!("{file_id}.");
        for entry in std::fs::read_dir(&self.root).ok()?.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&prefix) {
                continue;
            }
            if name.ends_with(".json") {
                continue;
            }
            return Some(entry.path());
        }
        None
    }
}

impl ImageSource for FileImageSource {
    fn resolve(&self, file_id: &str) -> OcrResult<RgbImage> {
        let path = self
            .resolve_path(file_id)
            .ok_or_else(|| OcrError::not_found(format!("image {file_id}")))?;
        load_image(&path)
    }
}
