//! Configuration for the region pipeline and device selection.
//!
//! `PipelineConfig` carries the tunables of the processing stages.
//! `DeviceConfig` captures environment-style overrides for engine
//! placement so the resolution policy in [`crate::engine::device`] stays a
//! pure function of its inputs.

use crate::engine::Device;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Tunables for the region pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on the long side of model input images.
    pub max_side: u32,
    /// Padding applied around detector rectangles before recognition,
    /// as a fraction of the rectangle side length.
    pub pad_ratio: f32,
    /// Default cap on the number of regions returned by detection.
    pub default_max_regions: usize,
    /// Default minimum detector confidence.
    pub default_min_score: f32,
    /// Capacity of the bounded channel used by streaming recognition.
    pub stream_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_side: crate::processors::DEFAULT_MAX_SIDE,
            pad_ratio: crate::processors::DEFAULT_CROP_PAD_RATIO,
            default_max_regions: 10,
            default_min_score: 0.66,
            stream_capacity: 8,
        }
    }
}

/// Device placement overrides, typically sourced from the environment.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Forces every engine onto this device.
    pub device_override: Option<Device>,
    /// Forces the vision-language engine onto this device.
    pub vision_language_override: Option<Device>,
    /// Minimum VRAM in GiB required to place the vision-language engine
    /// on a discrete GPU under Windows.
    pub vision_language_min_vram_gb: f32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_override: None,
            vision_language_override: None,
            vision_language_min_vram_gb: 2.0,
        }
    }
}

impl DeviceConfig {
    /// Reads overrides from `OCR_DEVICE`, `VL_DEVICE` and
    /// `VL_MIN_VRAM_GB`.
    pub fn from_env() -> Self {
        Self {
            device_override: device_from_env("OCR_DEVICE"),
            vision_language_override: device_from_env("VL_DEVICE"),
            vision_language_min_vram_gb: match env::var("VL_MIN_VRAM_GB") {
                // An override that fails to parse falls back to a stricter floor.
                Ok(raw) => raw.trim().parse().unwrap_or(6.0),
                Err(_) => 2.0,
            },
        }
    }
}

fn device_from_env(var: &str) -> Option<Device> {
    let raw = env::var(var).ok()?;
    match raw.parse::<Device>() {
        Ok(device) => Some(device),
        Err(error) => {
            warn!(var, value = raw.as_str(), %error, "ignoring unparsable device override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_side, 1280);
        assert_eq!(config.pad_ratio, 0.05);
        assert_eq!(config.default_max_regions, 10);
        assert_eq!(config.default_min_score, 0.66);
    }

    #[test]
    fn test_device_config_default_vram_floor() {
        let config = DeviceConfig::default();
        assert!(config.device_override.is_none());
        assert_eq!(config.vision_language_min_vram_gb, 2.0);
    }
}
