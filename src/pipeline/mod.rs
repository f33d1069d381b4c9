//! The region pipeline: detection, batch recognition, and streaming
//! execution.
//!
//! [`PanelOcr`] is the outward-facing surface. It owns the collaborators
//! the pipeline needs (an [`ImageSource`], the [`EngineRegistry`], the
//! [`BoxCache`]) and exposes the four operations: `detect`, `recognize`,
//! `recognize_stream`, and cached-region read/write. The registry is
//! injected rather than ambient, so embedding applications control
//! engine lifetimes and tests swap in counting factories.

mod detect;
mod ocr;
mod progress;
mod streaming;

pub use detect::DetectionOutput;
pub use ocr::{parse_regions, RecognizeOptions, RegionFailure, RegionOutcome};
pub use progress::ProgressTracker;

use crate::cache::BoxCache;
use crate::core::{OcrResult, PipelineConfig};
use crate::domain::{CacheRecord, Region, ResizeMetadata, StreamEvent};
use crate::engine::EngineRegistry;
use crate::processors::image_prep::resize_for_model;
use crate::utils::ImageSource;
use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{info, warn};

/// The two-stage OCR pipeline over comic pages.
pub struct PanelOcr {
    config: PipelineConfig,
    source: Box<dyn ImageSource>,
    registry: Arc<EngineRegistry>,
    cache: BoxCache,
}

impl PanelOcr {
    /// Assembles a pipeline from its collaborators.
    pub fn new(
        config: PipelineConfig,
        source: Box<dyn ImageSource>,
        registry: Arc<EngineRegistry>,
        cache: BoxCache,
    ) -> Self {
        Self {
            config,
            source,
            registry,
            cache,
        }
    }

    /// Runs detection on the referenced image.
    ///
    /// Returns the suppressed, normalized regions together with the
    /// resize metadata, and persists them as a cache record side effect.
    /// A cache write failure is logged, never surfaced.
    pub fn detect(
        &self,
        file_id: &str,
        max_regions: usize,
        min_score: f32,
    ) -> OcrResult<DetectionOutput> {
        info!(file_id, max_regions, min_score, "detect request");
        let image = self.source.resolve(file_id)?;
        let output = detect::run_detection(
            &self.registry,
            &image,
            max_regions,
            min_score,
            self.config.max_side,
        )?;
        if let Err(error) = self
            .cache
            .write(file_id, &output.regions, Some(&output.meta))
        {
            warn!(file_id, %error, "failed to persist detection regions");
        }
        info!(file_id, regions = output.regions.len(), "detect response");
        Ok(output)
    }

    /// Batch recognition over the supplied regions.
    ///
    /// Returns one entry per region keyed by id. Per-region failures
    /// record the empty string; the response is always fully shaped.
    pub fn recognize(
        &self,
        file_id: &str,
        regions: &[Region],
        opts: &RecognizeOptions,
    ) -> OcrResult<BTreeMap<String, String>> {
        info!(
            file_id,
            regions = regions.len(),
            language = opts.language.as_deref().unwrap_or(""),
            "recognize request"
        );
        let image = self.source.resolve(file_id)?;
        let (resized, _meta) = resize_for_model(&image, self.config.max_side);
        ocr::run_batch(
            &self.registry,
            &resized,
            regions,
            opts,
            self.config.pad_ratio,
        )
    }

    /// Streaming recognition: events arrive on the returned channel as
    /// regions complete, ending with a single completion event.
    ///
    /// Dropping the receiver cancels the stream at the next region
    /// boundary. Image resolution errors surface before any event is
    /// produced.
    pub fn recognize_stream(
        &self,
        file_id: &str,
        regions: Vec<Region>,
        opts: RecognizeOptions,
    ) -> OcrResult<Receiver<StreamEvent>> {
        info!(file_id, regions = regions.len(), "recognize stream request");
        let image = self.source.resolve(file_id)?;
        let (resized, _meta) = resize_for_model(&image, self.config.max_side);
        Ok(streaming::run_stream(
            Arc::clone(&self.registry),
            Arc::new(resized),
            regions,
            opts,
            self.config.pad_ratio,
            self.config.stream_capacity,
        ))
    }

    /// Returns the cached regions for an image, if a record exists.
    pub fn cached_regions(&self, file_id: &str) -> OcrResult<Option<CacheRecord>> {
        self.cache.read(file_id)
    }

    /// Replaces the cached regions for an image.
    ///
    /// Omitted metadata merges from the previous record, best-effort.
    pub fn set_cached_regions(
        &self,
        file_id: &str,
        regions: &[Region],
        meta: Option<&ResizeMetadata>,
    ) -> OcrResult<()> {
        self.cache.write(file_id, regions, meta)
    }
}
