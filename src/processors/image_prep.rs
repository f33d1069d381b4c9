//! Image preparation: model-facing resize and padded crop extraction.

use crate::domain::{PixelRect, Region, ResizeMetadata};
use crate::processors::geometry;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

/// Default upper bound on the long side of model input images.
pub const DEFAULT_MAX_SIDE: u32 = 1280;

/// Default padding around detector rectangles, as a fraction of the
/// rectangle side length.
pub const DEFAULT_CROP_PAD_RATIO: f32 = 0.05;

/// Resizes an image so that `max(width, height) <= max_side`, keeping the
/// aspect ratio.
///
/// Scaling is uniform and never upscales, so normalized coordinates stay
/// identical between the original and resized image. The color mode is
/// preserved; a high-quality filter is used for downscaling.
///
/// # Arguments
///
/// * `img` - The image to resize
/// * `max_side` - Upper bound for the longer dimension
///
/// # Returns
///
/// The (possibly unchanged) image together with [`ResizeMetadata`]
/// recording both sizes and the applied scale.
pub fn resize_for_model(img: &RgbImage, max_side: u32) -> (RgbImage, ResizeMetadata) {
    let (w, h) = img.dimensions();
    let long_side = w.max(h).max(1);
    let scale = (max_side as f32 / long_side as f32).min(1.0);

    if scale < 1.0 {
        let new_w = ((w as f32 * scale) as u32).max(1);
        let new_h = ((h as f32 * scale) as u32).max(1);
        let resized = imageops::resize(img, new_w, new_h, FilterType::Lanczos3);
        debug!(
            orig_size = ?(w, h),
            resized_size = ?(new_w, new_h),
            scale,
            "resized image for model input"
        );
        (
            resized,
            ResizeMetadata {
                orig_size: (w, h),
                resized_size: (new_w, new_h),
                scale,
            },
        )
    } else {
        (
            img.clone(),
            ResizeMetadata {
                orig_size: (w, h),
                resized_size: (w, h),
                scale: 1.0,
            },
        )
    }
}

/// Extracts the padded crop for a normalized region.
///
/// The region is denormalized against the image size; an empty rectangle
/// yields `None`. Otherwise each side is padded by
/// `max(1, round(side_len * pad_ratio))` pixels (no padding when
/// `pad_ratio` is zero or negative) and re-clamped to the image bounds,
/// so recognition engines always receive a small contextual margin
/// around tight detector boxes without ever seeing an invalid crop.
///
/// # Arguments
///
/// * `img` - The source image
/// * `region` - A region in normalized coordinates
/// * `pad_ratio` - Padding fraction applied per side
///
/// # Returns
///
/// The cropped image and the final pixel rectangle, or `None` when the
/// region denormalizes (or collapses after padding) to an empty
/// rectangle.
pub fn crop_region(
    img: &RgbImage,
    region: &Region,
    pad_ratio: f32,
) -> Option<(RgbImage, PixelRect)> {
    let (width, height) = img.dimensions();
    let rect = geometry::denormalize(region, (width, height));
    if rect.is_empty() {
        return None;
    }

    let (pad_x, pad_y) = if pad_ratio > 0.0 {
        (
            ((rect.width() as f32 * pad_ratio).round() as u32).max(1),
            ((rect.height() as f32 * pad_ratio).round() as u32).max(1),
        )
    } else {
        (0, 0)
    };

    let x1 = rect.x1.saturating_sub(pad_x);
    let y1 = rect.y1.saturating_sub(pad_y);
    let x2 = (rect.x2 + pad_x).min(width);
    let y2 = (rect.y2 + pad_y).min(height);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    let crop = imageops::crop_imm(img, x1, y1, x2 - x1, y2 - y1).to_image();
    Some((crop, PixelRect { x1, y1, x2, y2 }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegionKind;

    fn norm_region(x: f32, y: f32, w: f32, h: f32) -> Region {
        Region {
            id: "r".to_string(),
            kind: RegionKind::TextBubble,
            score: None,
            x,
            y,
            w,
            h,
        }
    }

    #[test]
    fn test_resize_identity_when_within_bound() {
        let img = RgbImage::new(640, 480);
        let (resized, meta) = resize_for_model(&img, 1280);
        assert_eq!(resized.dimensions(), (640, 480));
        assert_eq!(meta.orig_size, (640, 480));
        assert_eq!(meta.resized_size, (640, 480));
        assert_eq!(meta.scale, 1.0);
    }

    #[test]
    fn test_resize_never_upscales_and_keeps_aspect() {
        let img = RgbImage::new(2560, 1440);
        let (resized, meta) = resize_for_model(&img, 1280);
        assert_eq!(resized.dimensions(), (1280, 720));
        assert_eq!(meta.resized_size, (1280, 720));
        assert_eq!(meta.scale, 0.5);
        assert!(meta.scale <= 1.0);

        // The short-side-long image scales by the same uniform factor.
        let img = RgbImage::new(1440, 2560);
        let (resized, meta) = resize_for_model(&img, 1280);
        assert_eq!(resized.dimensions(), (720, 1280));
        assert_eq!(meta.scale, 0.5);
    }

    #[test]
    fn test_crop_without_padding_matches_denormalized_rect() {
        let img = RgbImage::new(100, 100);
        // One pixel inside the image bounds on every side.
        let region = norm_region(0.01, 0.01, 0.98, 0.98);
        let (crop, rect) = crop_region(&img, &region, 0.0).unwrap();
        let expected = crate::processors::geometry::denormalize(&region, (100, 100));
        assert_eq!(rect, expected);
        assert_eq!(crop.dimensions(), (rect.width(), rect.height()));
    }

    #[test]
    fn test_crop_pads_and_clamps_to_bounds() {
        let img = RgbImage::new(200, 100);
        let region = norm_region(0.0, 0.0, 0.5, 0.5);
        let (crop, rect) = crop_region(&img, &region, 0.05).unwrap();
        // Padding cannot move the origin below zero.
        assert_eq!(rect.x1, 0);
        assert_eq!(rect.y1, 0);
        // 100x50 rect padded by 5/3 pixels on the free sides.
        assert_eq!(rect.x2, 105);
        assert_eq!(rect.y2, 53);
        assert_eq!(crop.dimensions(), (105, 53));
    }

    #[test]
    fn test_crop_small_rect_gets_minimum_padding() {
        let img = RgbImage::new(100, 100);
        // A 2x2 rect: the computed pad rounds to zero but floors at one.
        let region = norm_region(0.5, 0.5, 0.02, 0.02);
        let (_, rect) = crop_region(&img, &region, 0.05).unwrap();
        assert_eq!(rect.x1, 49);
        assert_eq!(rect.y1, 49);
        assert_eq!(rect.x2, 53);
        assert_eq!(rect.y2, 53);
    }

    #[test]
    fn test_crop_invalid_region_returns_none() {
        let img = RgbImage::new(100, 100);
        let region = norm_region(f32::NAN, 0.0, 0.5, 0.5);
        assert!(crop_region(&img, &region, 0.05).is_none());
    }
}
