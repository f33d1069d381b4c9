//! Engine keys, capability traits, and the provider boundary.
//!
//! Detection and recognition models are expensive, long-lived,
//! process-wide singletons; regions are transient per-request data. This
//! module defines the keys engines are cached under, the minimal
//! capability surfaces the pipeline calls through, and the registry that
//! owns every constructed instance.

pub mod adapters;
pub mod device;
pub mod registry;

pub use device::{default_precision, resolve_device, SystemProfile};
pub use registry::{EngineFactory, EngineInstance, EngineRegistry};

use crate::core::{OcrError, OcrResult};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Engines the registry can construct and cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Speech-bubble detector producing raw scored rectangles.
    BubbleDetector,
    /// Japanese-script-specialized recognizer.
    MangaOcr,
    /// General vision-language recognizer; also handles sound-effect
    /// lettering.
    VisionLanguage,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::BubbleDetector => write!(f, "bubble-detector"),
            EngineKind::MangaOcr => write!(f, "manga-ocr"),
            EngineKind::VisionLanguage => write!(f, "vision-language"),
        }
    }
}

/// Compute device an engine is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Discrete NVIDIA GPU.
    Cuda,
    /// Apple unified-memory accelerator.
    Metal,
    /// General-purpose compute.
    Cpu,
}

impl Device {
    /// Returns true for accelerator devices.
    pub fn is_accelerator(&self) -> bool {
        !matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda => write!(f, "cuda"),
            Device::Metal => write!(f, "metal"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

impl FromStr for Device {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cuda" => Ok(Device::Cuda),
            // "mps" is the name unified-memory accelerators go by elsewhere.
            "metal" | "mps" => Ok(Device::Metal),
            "cpu" => Ok(Device::Cpu),
            other => Err(OcrError::invalid_input(format!(
                "unknown device: {other}"
            ))),
        }
    }
}

/// Numeric precision engine weights are loaded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 16-bit floating point.
    Half,
    /// 32-bit floating point.
    Full,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Half => write!(f, "half"),
            Precision::Full => write!(f, "full"),
        }
    }
}

/// Registry cache key: one engine instance exists per distinct key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineKey {
    /// Which engine.
    pub kind: EngineKind,
    /// Where it runs.
    pub device: Device,
    /// Weight precision it was loaded at.
    pub precision: Precision,
}

/// Options forwarded to a recognizer call.
///
/// Adapters drop the fields their wrapped provider does not accept, so
/// callers always fill the full request (see [`adapters`]).
#[derive(Debug, Clone, Default)]
pub struct InferRequest {
    /// Requested language hint.
    pub language: Option<String>,
    /// Generation budget for autoregressive engines.
    pub max_new_tokens: Option<u32>,
}

/// Uniform recognition capability: cropped raster in, raw text out.
///
/// Implementations may fail per call; the pipeline treats such failures
/// as recoverable and region-local.
pub trait TextRecognizer: Send + Sync {
    /// Recognizes the text in a cropped region.
    fn recognize(&self, crop: &RgbImage, request: &InferRequest) -> OcrResult<String>;
}

/// Raw detector output: a scored, labeled pixel rectangle.
///
/// Detectors apply no score threshold of their own; filtering happens in
/// the pipeline.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Confidence in `[0, 1]`.
    pub score: f32,
    /// Class label, e.g. `text_bubble`.
    pub label: String,
    /// `(x1, y1, x2, y2)` against the image the detector saw.
    pub rect: (f32, f32, f32, f32),
}

/// Detection capability over a full (resized) page.
pub trait RegionDetector: Send + Sync {
    /// Returns all raw detections for the image, unthresholded.
    fn detect(&self, image: &RgbImage) -> OcrResult<Vec<RawDetection>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_parsing_accepts_mps_alias() {
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda);
        assert_eq!("MPS".parse::<Device>().unwrap(), Device::Metal);
        assert_eq!("metal".parse::<Device>().unwrap(), Device::Metal);
        assert_eq!(" cpu ".parse::<Device>().unwrap(), Device::Cpu);
        assert!("tpu".parse::<Device>().is_err());
    }

    #[test]
    fn test_engine_kind_serde_names() {
        assert_eq!(
            serde_json::to_value(EngineKind::VisionLanguage).unwrap(),
            "vision-language"
        );
        assert_eq!(
            serde_json::from_str::<EngineKind>("\"manga-ocr\"").unwrap(),
            EngineKind::MangaOcr
        );
    }
}
