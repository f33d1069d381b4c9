//! Lazy, keyed construction and caching of engine instances.
//!
//! Construction is expensive (multi-second weight loads), so the registry
//! guarantees that concurrent first use of the same key constructs
//! exactly once: check the cache, take a key-scoped gate, re-check,
//! construct, publish. Unrelated keys construct concurrently. Failed
//! constructions publish nothing.

use super::device::{default_precision, resolve_device, SystemProfile};
use super::{Device, EngineKey, EngineKind, Precision, RegionDetector, TextRecognizer};
use crate::core::{DeviceConfig, OcrError, OcrResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

/// A constructed engine published in the registry.
///
/// Variants mirror the two capability surfaces. Accessors return
/// `InvalidInput` on a variant mismatch so wiring bugs surface as errors
/// rather than panics.
pub enum EngineInstance {
    /// A region detector.
    Detector(Box<dyn RegionDetector>),
    /// A text recognizer.
    Recognizer(Box<dyn TextRecognizer>),
}

impl std::fmt::Debug for EngineInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineInstance::Detector(_) => f.write_str("EngineInstance::Detector"),
            EngineInstance::Recognizer(_) => f.write_str("EngineInstance::Recognizer"),
        }
    }
}

impl EngineInstance {
    /// Borrows the detector capability.
    pub fn as_detector(&self) -> OcrResult<&dyn RegionDetector> {
        match self {
            EngineInstance::Detector(detector) => Ok(detector.as_ref()),
            EngineInstance::Recognizer(_) => Err(OcrError::invalid_input(
                "expected a detector engine, got a recognizer",
            )),
        }
    }

    /// Borrows the recognizer capability.
    pub fn as_recognizer(&self) -> OcrResult<&dyn TextRecognizer> {
        match self {
            EngineInstance::Recognizer(recognizer) => Ok(recognizer.as_ref()),
            EngineInstance::Detector(_) => Err(OcrError::invalid_input(
                "expected a recognizer engine, got a detector",
            )),
        }
    }
}

/// Builds engine instances for a key.
///
/// Implementations wrap the actual weight loading and kernel setup.
/// `build` is invoked at most once per key per cascade attempt; a
/// returned error triggers the precision/device fallbacks in
/// [`EngineRegistry::load`].
pub trait EngineFactory: Send + Sync {
    /// Constructs the engine for `(kind, device, precision)`.
    fn build(
        &self,
        kind: EngineKind,
        device: Device,
        precision: Precision,
    ) -> OcrResult<EngineInstance>;
}

/// Process-wide cache of engine instances keyed by
/// `(kind, device, precision)`.
pub struct EngineRegistry {
    factory: Box<dyn EngineFactory>,
    device_config: DeviceConfig,
    profile: SystemProfile,
    engines: RwLock<HashMap<EngineKey, Arc<EngineInstance>>>,
    gates: Mutex<HashMap<EngineKey, Arc<Mutex<()>>>>,
}

impl EngineRegistry {
    /// Creates a registry around a factory and the placement inputs.
    pub fn new(
        factory: Box<dyn EngineFactory>,
        device_config: DeviceConfig,
        profile: SystemProfile,
    ) -> Self {
        Self {
            factory,
            device_config,
            profile,
            engines: RwLock::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves device and precision for `kind` and returns the cached or
    /// newly constructed engine.
    pub fn engine(&self, kind: EngineKind) -> OcrResult<Arc<EngineInstance>> {
        let device = resolve_device(kind, &self.device_config, &self.profile);
        let precision = default_precision(device);
        self.load(kind, device, precision)
    }

    /// Loads an engine at an explicit key, applying the fallback cascade.
    ///
    /// A failed load at half precision retries once at full precision on
    /// the same device; a failed accelerator construction then retries
    /// once on CPU at full precision. The final failure surfaces as
    /// [`OcrError::EngineUnavailable`]. The cascade is bounded per call
    /// and never loops.
    pub fn load(
        &self,
        kind: EngineKind,
        device: Device,
        precision: Precision,
    ) -> OcrResult<Arc<EngineInstance>> {
        let mut last = match self.load_exact(EngineKey {
            kind,
            device,
            precision,
        }) {
            Ok(engine) => return Ok(engine),
            Err(error) => error,
        };

        if precision == Precision::Half {
            warn!(
                engine = %kind,
                %device,
                error = %last,
                "half-precision load failed, retrying at full precision"
            );
            match self.load_exact(EngineKey {
                kind,
                device,
                precision: Precision::Full,
            }) {
                Ok(engine) => return Ok(engine),
                Err(error) => last = error,
            }
        }

        if device.is_accelerator() {
            warn!(
                engine = %kind,
                %device,
                error = %last,
                "accelerator load failed, falling back to cpu"
            );
            match self.load_exact(EngineKey {
                kind,
                device: Device::Cpu,
                precision: Precision::Full,
            }) {
                Ok(engine) => return Ok(engine),
                Err(error) => last = error,
            }
        }

        Err(OcrError::engine_unavailable(kind, last.to_string()))
    }

    /// Loads exactly one key with the double-checked per-key gate.
    fn load_exact(&self, key: EngineKey) -> OcrResult<Arc<EngineInstance>> {
        if let Some(engine) = self.engines.read().unwrap().get(&key) {
            return Ok(engine.clone());
        }

        let gate = {
            let mut gates = self.gates.lock().unwrap();
            gates.entry(key).or_default().clone()
        };
        let _guard = gate.lock().unwrap();

        // Another request may have finished construction while this one
        // waited on the gate.
        if let Some(engine) = self.engines.read().unwrap().get(&key) {
            return Ok(engine.clone());
        }

        info!(
            engine = %key.kind,
            device = %key.device,
            precision = %key.precision,
            "constructing engine"
        );
        let engine = Arc::new(self.factory.build(key.kind, key.device, key.precision)?);
        self.engines.write().unwrap().insert(key, engine.clone());
        Ok(engine)
    }
}
