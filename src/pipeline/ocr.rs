//! Per-region recognition: engine routing, crop dispatch, and batch
//! execution with per-region error isolation.

use super::progress::ProgressTracker;
use crate::core::{OcrError, OcrResult};
use crate::domain::{Region, RegionKind};
use crate::engine::{EngineKind, EngineRegistry, InferRequest};
use crate::processors::geometry::mint_region_id;
use crate::processors::image_prep::crop_region;
use crate::processors::text::normalize_recognized_text;
use image::RgbImage;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, warn};

/// Options governing a recognition request.
#[derive(Debug, Clone, Default)]
pub struct RecognizeOptions {
    /// Requested language hint; `ja` selects the script-specialized
    /// default engine.
    pub language: Option<String>,
    /// Per-region-kind engine overrides.
    pub routing: HashMap<RegionKind, EngineKind>,
}

/// Why a single region produced no text.
///
/// Always recovered locally: the batch records an empty string and the
/// stream emits an error-tagged event. Sibling regions are unaffected.
#[derive(Debug, Clone)]
pub struct RegionFailure {
    /// Failure reason, suitable for an error event.
    pub reason: String,
}

impl RegionFailure {
    pub(crate) const INVALID_BOX: &'static str = "invalid_box";

    fn invalid_box() -> Self {
        Self {
            reason: Self::INVALID_BOX.to_string(),
        }
    }

    fn engine(error: OcrError) -> Self {
        Self {
            reason: error.to_string(),
        }
    }
}

/// Outcome of one region.
///
/// `Text` is the success arm; `Failed` is the recoverable arm. The fatal
/// arm is the surrounding `Err(OcrError)`, reserved for engine
/// construction failures and wiring bugs.
#[derive(Debug)]
pub enum RegionOutcome {
    /// Normalized recognized text (possibly empty).
    Text(String),
    /// The region was skipped or its engine call failed.
    Failed(RegionFailure),
}

/// Default recognition engine for a language hint.
pub(crate) fn default_engine(language: Option<&str>) -> EngineKind {
    match language {
        Some(lang) if lang.eq_ignore_ascii_case("ja") => EngineKind::MangaOcr,
        _ => EngineKind::VisionLanguage,
    }
}

/// Selects the engine for a region: explicit routing first, sound-effect
/// lettering to the vision-language engine, then the language default.
pub(crate) fn route_engine(
    kind: RegionKind,
    routing: &HashMap<RegionKind, EngineKind>,
    language: Option<&str>,
) -> EngineKind {
    if let Some(engine) = routing.get(&kind) {
        return *engine;
    }
    if kind == RegionKind::Sounds {
        return EngineKind::VisionLanguage;
    }
    default_engine(language)
}

/// Generation budget for autoregressive engines, scaled to the crop size.
///
/// Larger crops get proportionally more budget within a floor and a
/// ceiling, trading latency against truncation risk.
pub(crate) fn adaptive_token_budget(width: u32, height: u32) -> u32 {
    let area = (width as f64 * height as f64).max(1.0);
    let budget = (0.13 * area.sqrt()).round() as u32;
    budget.clamp(18, 64)
}

/// Runs one region through crop extraction and its engine.
///
/// Crop failures and per-call engine failures come back as
/// [`RegionOutcome::Failed`]; only engine construction errors (and
/// routing to a non-recognizer engine) propagate as `Err`.
pub(crate) fn recognize_region(
    registry: &EngineRegistry,
    image: &RgbImage,
    region: &Region,
    engine_kind: EngineKind,
    language: Option<&str>,
    pad_ratio: f32,
) -> OcrResult<RegionOutcome> {
    let Some((crop, rect)) = crop_region(image, region, pad_ratio) else {
        debug!(box_id = %region.id, "region denormalizes to an empty rectangle");
        return Ok(RegionOutcome::Failed(RegionFailure::invalid_box()));
    };

    let engine = registry.engine(engine_kind)?;
    let recognizer = engine.as_recognizer()?;

    let request = InferRequest {
        language: language.map(str::to_string),
        max_new_tokens: Some(adaptive_token_budget(crop.width(), crop.height())),
    };
    match recognizer.recognize(&crop, &request) {
        Ok(raw) => {
            debug!(
                box_id = %region.id,
                engine = %engine_kind,
                crop = ?rect,
                "region recognized"
            );
            Ok(RegionOutcome::Text(normalize_recognized_text(&raw)))
        }
        Err(error) => {
            warn!(box_id = %region.id, engine = %engine_kind, %error, "region recognition failed");
            Ok(RegionOutcome::Failed(RegionFailure::engine(error)))
        }
    }
}

/// Batch recognition over a region list.
///
/// One result per region, keyed by id (minted when missing). A failed
/// region records the empty string; the batch never aborts on a
/// per-region failure.
pub(crate) fn run_batch(
    registry: &EngineRegistry,
    image: &RgbImage,
    regions: &[Region],
    opts: &RecognizeOptions,
    pad_ratio: f32,
) -> OcrResult<BTreeMap<String, String>> {
    let mut results = BTreeMap::new();
    let mut tracker = ProgressTracker::new(regions.len());

    for region in regions {
        let box_id = if region.id.is_empty() {
            mint_region_id()
        } else {
            region.id.clone()
        };
        let engine_kind = route_engine(region.kind, &opts.routing, opts.language.as_deref());
        let started = Instant::now();

        match recognize_region(
            registry,
            image,
            region,
            engine_kind,
            opts.language.as_deref(),
            pad_ratio,
        )? {
            RegionOutcome::Text(text) => {
                tracker.record_done();
                debug!(
                    box_id = %box_id,
                    engine = %engine_kind,
                    chars = text.chars().count(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    progress = %tracker.progress_label(),
                    eta_ms = tracker.eta_ms(),
                    "region done"
                );
                results.insert(box_id, text);
            }
            RegionOutcome::Failed(failure) => {
                warn!(box_id = %box_id, reason = %failure.reason, "recording empty result");
                results.insert(box_id, String::new());
            }
        }
    }

    Ok(results)
}

/// Parses a JSON region list, rejecting non-array payloads before any
/// engine work begins.
pub fn parse_regions(payload: &str) -> OcrResult<Vec<Region>> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|error| OcrError::invalid_input(format!("invalid regions payload: {error}")))?;
    if !value.is_array() {
        return Err(OcrError::invalid_input("regions must be a JSON list"));
    }
    serde_json::from_value(value)
        .map_err(|error| OcrError::invalid_input(format!("invalid regions payload: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_precedence() {
        let mut routing = HashMap::new();
        routing.insert(RegionKind::TextBubble, EngineKind::VisionLanguage);

        // Explicit routing wins over the language default.
        assert_eq!(
            route_engine(RegionKind::TextBubble, &routing, Some("ja")),
            EngineKind::VisionLanguage
        );
        // Sound effects default to the vision-language engine.
        assert_eq!(
            route_engine(RegionKind::Sounds, &HashMap::new(), Some("ja")),
            EngineKind::VisionLanguage
        );
        // Japanese falls back to the script-specialized engine.
        assert_eq!(
            route_engine(RegionKind::Other, &HashMap::new(), Some("ja")),
            EngineKind::MangaOcr
        );
        assert_eq!(
            route_engine(RegionKind::Other, &HashMap::new(), Some("en")),
            EngineKind::VisionLanguage
        );
        assert_eq!(
            route_engine(RegionKind::Other, &HashMap::new(), None),
            EngineKind::VisionLanguage
        );
    }

    #[test]
    fn test_adaptive_token_budget_clamps() {
        // Tiny crops floor at 18 tokens.
        assert_eq!(adaptive_token_budget(10, 10), 18);
        // A 400x400 crop: 0.13 * 400 = 52.
        assert_eq!(adaptive_token_budget(400, 400), 52);
        // Huge crops cap at 64.
        assert_eq!(adaptive_token_budget(2000, 2000), 64);
        // Degenerate sizes still produce the floor.
        assert_eq!(adaptive_token_budget(0, 0), 18);
    }

    #[test]
    fn test_parse_regions_rejects_non_lists() {
        assert!(parse_regions("not json").is_err());
        assert!(parse_regions(r#"{"x": 1}"#).is_err());
        let regions =
            parse_regions(r#"[{"id":"a","x":0.0,"y":0.0,"w":0.5,"h":0.5}]"#).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id, "a");
    }
}
