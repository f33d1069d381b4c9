//! Detection: raw detector output to suppressed, normalized regions.

use crate::core::OcrResult;
use crate::domain::{Region, RegionKind, ResizeMetadata};
use crate::engine::{EngineKind, EngineRegistry};
use crate::processors::geometry::{mint_region_id, normalize, suppress};
use crate::processors::image_prep::resize_for_model;
use image::RgbImage;
use tracing::{debug, info};

/// Region kinds eligible to come out of detection; everything else is
/// discarded before suppression.
const ALLOWED_KINDS: &[RegionKind] = &[RegionKind::TextBubble];

/// Detection result: normalized regions plus the resize bookkeeping the
/// coordinates were computed against.
#[derive(Debug, Clone)]
pub struct DetectionOutput {
    /// Suppressed, normalized regions in score-descending order.
    pub regions: Vec<Region>,
    /// Resize metadata for the processed image.
    pub meta: ResizeMetadata,
}

/// Runs the detector over a page and turns its raw output into
/// normalized regions.
///
/// The raw detections are filtered by a clamped minimum score and the
/// allowed kind set, strictly suppressed down to `max_regions`, and
/// normalized against the resized image so the coordinates survive any
/// later resize.
pub(crate) fn run_detection(
    registry: &EngineRegistry,
    image: &RgbImage,
    max_regions: usize,
    min_score: f32,
    max_side: u32,
) -> OcrResult<DetectionOutput> {
    let (resized, meta) = resize_for_model(image, max_side);

    let engine = registry.engine(EngineKind::BubbleDetector)?;
    let detector = engine.as_detector()?;
    let raw = detector.detect(&resized)?;

    let min_score = if min_score.is_finite() {
        min_score.clamp(0.0, 0.99)
    } else {
        0.66
    };

    let mut boxes = Vec::new();
    for detection in raw {
        if detection.score < min_score {
            continue;
        }
        let kind = RegionKind::from_label(&detection.label);
        if !ALLOWED_KINDS.contains(&kind) {
            continue;
        }
        let (x1, y1, x2, y2) = detection.rect;
        boxes.push(Region {
            id: mint_region_id(),
            kind,
            score: Some(detection.score),
            x: x1,
            y: y1,
            w: x2 - x1,
            h: y2 - y1,
        });
    }

    let before = boxes.len();
    let kept = suppress(&boxes, max_regions);
    debug!(min_score, before, after = kept.len(), "filtered detections");

    let regions = normalize(&kept, meta.resized_size);
    let top_scores: Vec<f32> = regions.iter().take(5).filter_map(|r| r.score).collect();
    info!(total = regions.len(), ?top_scores, "detection regions ready");

    Ok(DetectionOutput { regions, meta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeviceConfig, OcrError};
    use crate::engine::{
        Device, EngineFactory, EngineInstance, Precision, RawDetection, RegionDetector,
        SystemProfile,
    };

    struct FixedDetector(Vec<RawDetection>);

    impl RegionDetector for FixedDetector {
        fn detect(&self, _image: &RgbImage) -> OcrResult<Vec<RawDetection>> {
            Ok(self.0.clone())
        }
    }

    struct DetectorFactory(Vec<RawDetection>);

    impl EngineFactory for DetectorFactory {
        fn build(
            &self,
            kind: EngineKind,
            _device: Device,
            _precision: Precision,
        ) -> OcrResult<EngineInstance> {
            match kind {
                EngineKind::BubbleDetector => {
                    Ok(EngineInstance::Detector(Box::new(FixedDetector(
                        self.0.clone(),
                    ))))
                }
                other => Err(OcrError::engine_unavailable(other, "not wired in this test")),
            }
        }
    }

    fn raw(score: f32, label: &str, rect: (f32, f32, f32, f32)) -> RawDetection {
        RawDetection {
            score,
            label: label.to_string(),
            rect,
        }
    }

    fn registry_with(detections: Vec<RawDetection>) -> EngineRegistry {
        EngineRegistry::new(
            Box::new(DetectorFactory(detections)),
            DeviceConfig::default(),
            SystemProfile::default(),
        )
    }

    #[test]
    fn test_detection_filters_suppresses_and_normalizes() {
        let registry = registry_with(vec![
            // Kept: highest score.
            raw(0.9, "text_bubble", (10.0, 10.0, 60.0, 60.0)),
            // Overlaps the first box, suppressed despite passing filters.
            raw(0.8, "text_bubble", (20.0, 20.0, 70.0, 70.0)),
            // Below the score floor.
            raw(0.2, "text_bubble", (80.0, 80.0, 90.0, 90.0)),
            // Wrong label.
            raw(0.95, "panel_border", (0.0, 0.0, 5.0, 5.0)),
            // Kept: disjoint from the first box.
            raw(0.7, "text_bubble", (70.0, 10.0, 90.0, 30.0)),
        ]);
        let image = RgbImage::new(100, 100);

        let output = run_detection(&registry, &image, 10, 0.66, 1280).unwrap();
        assert_eq!(output.regions.len(), 2);
        assert_eq!(output.meta.scale, 1.0);
        assert_eq!(output.regions[0].score, Some(0.9));
        assert_eq!(output.regions[1].score, Some(0.7));

        // Coordinates are normalized against the resized size.
        let first = &output.regions[0];
        assert!((first.x - 0.1).abs() < 1e-6);
        assert!((first.y - 0.1).abs() < 1e-6);
        assert!((first.w - 0.5).abs() < 1e-6);
        assert!((first.h - 0.5).abs() < 1e-6);
        assert!(!first.id.is_empty());
        assert_eq!(first.kind, RegionKind::TextBubble);
    }

    #[test]
    fn test_detection_caps_regions_at_limit() {
        let registry = registry_with(vec![
            raw(0.9, "text_bubble", (0.0, 0.0, 10.0, 10.0)),
            raw(0.8, "text_bubble", (20.0, 20.0, 30.0, 30.0)),
            raw(0.7, "text_bubble", (40.0, 40.0, 50.0, 50.0)),
        ]);
        let image = RgbImage::new(100, 100);
        let output = run_detection(&registry, &image, 2, 0.5, 1280).unwrap();
        assert_eq!(output.regions.len(), 2);
    }

    #[test]
    fn test_detection_clamps_out_of_range_score_floor() {
        let registry = registry_with(vec![raw(0.995, "text_bubble", (0.0, 0.0, 10.0, 10.0))]);
        let image = RgbImage::new(100, 100);
        // A floor above the clamp range still keeps near-certain boxes.
        let output = run_detection(&registry, &image, 10, 5.0, 1280).unwrap();
        assert_eq!(output.regions.len(), 1);
        // A NaN floor falls back to the default.
        let output = run_detection(&registry, &image, 10, f32::NAN, 1280).unwrap();
        assert_eq!(output.regions.len(), 1);
    }

    #[test]
    fn test_detector_construction_failure_is_fatal() {
        struct NoFactory;
        impl EngineFactory for NoFactory {
            fn build(
                &self,
                kind: EngineKind,
                _device: Device,
                _precision: Precision,
            ) -> OcrResult<EngineInstance> {
                Err(OcrError::engine_unavailable(kind, "weights missing"))
            }
        }
        let registry = EngineRegistry::new(
            Box::new(NoFactory),
            DeviceConfig::default(),
            SystemProfile::default(),
        );
        let image = RgbImage::new(100, 100);
        let err = run_detection(&registry, &image, 10, 0.66, 1280).unwrap_err();
        assert!(matches!(err, OcrError::EngineUnavailable { .. }));
    }
}
