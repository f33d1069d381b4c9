//! # Panel OCR
//!
//! A Rust library that finds speech bubbles on comic pages and recognizes
//! the text inside them. Images run through a two-stage pipeline: region
//! detection followed by per-region text recognition, with batch and
//! incrementally-streamed results.
//!
//! ## Features
//!
//! - Aspect-preserving resize with coordinates that survive rescaling
//! - Strict greedy suppression of overlapping detections
//! - Lazy engine registry with device and precision fallback cascades
//! - Per-region error isolation: one bad region never aborts a batch
//! - Streaming execution over a bounded channel with per-region events
//! - Sidecar cache of detected regions with metadata merge semantics
//!
//! Model weights and inference kernels are not part of this crate;
//! detection and recognition engines are injected behind the
//! [`engine::RegionDetector`] and [`engine::TextRecognizer`] traits via an
//! [`engine::EngineFactory`].
//!
//! ## Modules
//!
//! * [`core`] - Error taxonomy and configuration
//! * [`domain`] - Region data model, resize metadata, cache records, stream events
//! * [`processors`] - Geometry, image preparation, and text cleanup
//! * [`engine`] - Engine keys, capability traits, device policy, and the registry
//! * [`pipeline`] - The [`pipeline::PanelOcr`] facade: detect, recognize, stream
//! * [`cache`] - Sidecar persistence of detection regions
//! * [`utils`] - Image loading and the [`utils::ImageSource`] abstraction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use panel_ocr::prelude::*;
//! use std::sync::Arc;
//!
//! # struct WeightsFactory;
//! # impl EngineFactory for WeightsFactory {
//! #     fn build(
//! #         &self,
//! #         kind: EngineKind,
//! #         device: Device,
//! #         precision: Precision,
//! #     ) -> OcrResult<EngineInstance> {
//! #         unimplemented!("wrap your model runtime here")
//! #     }
//! # }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Wire the pipeline with a factory that loads your model weights.
//! let registry = Arc::new(EngineRegistry::new(
//!     Box::new(WeightsFactory),
//!     DeviceConfig::from_env(),
//!     SystemProfile::detect(),
//! ));
//! let ocr = PanelOcr::new(
//!     PipelineConfig::default(),
//!     Box::new(FileImageSource::new("tmp")),
//!     registry,
//!     BoxCache::new("tmp"),
//! );
//!
//! // Detect speech bubbles, then recognize the text inside them.
//! let detection = ocr.detect("page-1", 10, 0.66)?;
//! let opts = RecognizeOptions {
//!     language: Some("ja".to_string()),
//!     ..Default::default()
//! };
//! let texts = ocr.recognize("page-1", &detection.regions, &opts)?;
//! for (box_id, text) in &texts {
//!     println!("{box_id}: {text}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod core;
pub mod domain;
pub mod engine;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use panel_ocr::prelude::*;
/// ```
///
/// Included items focus on the most common tasks: the [`PanelOcr`]
/// facade and its options, the engine registry and its wiring types,
/// the region data model, and the error types. For lower-level pieces
/// (geometry, text cleanup, adapters) import directly from the
/// respective modules.
pub mod prelude {
    pub use crate::cache::BoxCache;
    pub use crate::core::{DeviceConfig, OcrError, OcrResult, PipelineConfig};
    pub use crate::domain::{CacheRecord, Region, RegionKind, ResizeMetadata, StreamEvent};
    pub use crate::engine::{
        Device, EngineFactory, EngineInstance, EngineKind, EngineRegistry, InferRequest,
        Precision, RawDetection, RegionDetector, SystemProfile, TextRecognizer,
    };
    pub use crate::pipeline::{DetectionOutput, PanelOcr, RecognizeOptions};
    pub use crate::utils::{load_image, FileImageSource, ImageSource};
}
