//! Device resolution and precision policy.
//!
//! Placement is a pure function of a [`SystemProfile`] snapshot and the
//! configured overrides, so the fallback rules stay testable without an
//! accelerator present. Most engines simply take the best available
//! device; the vision-language engine additionally carries a denylist
//! (no unified-memory accelerators) and a VRAM floor on Windows.

use super::{Device, EngineKind, Precision};
use crate::core::DeviceConfig;
use std::env;
use tracing::{debug, warn};

/// Snapshot of accelerator availability used by the placement policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProfile {
    /// A CUDA device is present and usable.
    pub cuda_available: bool,
    /// A Metal device is present and usable.
    pub metal_available: bool,
    /// Total VRAM of the primary CUDA device in GiB, when known.
    pub cuda_vram_gb: Option<f32>,
    /// Whether the host runs Windows.
    pub is_windows: bool,
}

impl SystemProfile {
    /// Probes the current host.
    ///
    /// Accelerator presence is reported by the embedding application via
    /// `OCR_CUDA_AVAILABLE` / `OCR_CUDA_VRAM_GB`, since the weights and
    /// kernels live behind the provider boundary. Metal is assumed
    /// present on macOS hosts.
    pub fn detect() -> Self {
        let profile = Self {
            cuda_available: env_flag("OCR_CUDA_AVAILABLE"),
            metal_available: cfg!(target_os = "macos"),
            cuda_vram_gb: env::var("OCR_CUDA_VRAM_GB")
                .ok()
                .and_then(|raw| raw.trim().parse().ok()),
            is_windows: cfg!(windows),
        };
        debug!(?profile, "probed system profile");
        profile
    }
}

fn env_flag(var: &str) -> bool {
    matches!(
        env::var(var).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Resolves the device an engine kind runs on.
///
/// A configured override wins; otherwise the fastest available
/// accelerator is preferred, falling back to CPU. The vision-language
/// engine applies its own placement policy on top of the base choice.
pub fn resolve_device(kind: EngineKind, config: &DeviceConfig, profile: &SystemProfile) -> Device {
    let base = base_device(config, profile);
    match kind {
        EngineKind::VisionLanguage => resolve_vision_language_device(base, config, profile),
        _ => base,
    }
}

fn base_device(config: &DeviceConfig, profile: &SystemProfile) -> Device {
    if let Some(device) = config.device_override {
        return device;
    }
    if profile.cuda_available {
        return Device::Cuda;
    }
    if profile.metal_available {
        return Device::Metal;
    }
    Device::Cpu
}

/// Placement policy for the vision-language engine.
///
/// The engine never runs on unified-memory accelerators, and on a
/// Windows host with a discrete GPU it is kept off the accelerator when
/// available memory sits below the configured floor, to avoid
/// out-of-memory failures mid-request.
pub fn resolve_vision_language_device(
    requested: Device,
    config: &DeviceConfig,
    profile: &SystemProfile,
) -> Device {
    if let Some(device) = config.vision_language_override {
        return device;
    }
    if requested == Device::Metal {
        debug!("vision-language engine does not run on metal, using cpu");
        return Device::Cpu;
    }
    if requested != Device::Cuda {
        return Device::Cpu;
    }
    if profile.is_windows {
        let min_gb = config.vision_language_min_vram_gb;
        if let Some(vram_gb) = profile.cuda_vram_gb {
            if vram_gb + 0.25 < min_gb {
                warn!(
                    vram_gb,
                    min_gb, "skipping cuda for vision-language engine: low vram"
                );
                return Device::Cpu;
            }
        }
    }
    requested
}

/// Default weight precision for a device: half on accelerators, full on
/// general-purpose compute.
pub fn default_precision(device: Device) -> Precision {
    if device.is_accelerator() {
        Precision::Half
    } else {
        Precision::Full
    }
}
