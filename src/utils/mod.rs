//! Utility functions for image loading and resolution.

pub mod image;

pub use image::{load_image, FileImageSource, ImageSource, IMAGE_EXTENSIONS};
