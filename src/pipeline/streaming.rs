//! Streaming execution: one event per region over a bounded channel.
//!
//! A producer task walks the region list in order and writes one
//! [`StreamEvent`] per region, then a terminal completion event, into a
//! bounded channel the consumer drains. Events flush as produced; nothing
//! is buffered until stream end. When the consumer goes away the next
//! send fails and the producer stops before dispatching another region;
//! the region already in flight finishes normally.

use super::ocr::{recognize_region, route_engine, RecognizeOptions, RegionOutcome};
use super::progress::ProgressTracker;
use crate::domain::{Region, StreamEvent};
use crate::engine::EngineRegistry;
use crate::processors::geometry::mint_region_id;
use image::RgbImage;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::debug;

/// Spawns the producer task and hands back the consuming end.
pub(crate) fn run_stream(
    registry: Arc<EngineRegistry>,
    image: Arc<RgbImage>,
    regions: Vec<Region>,
    opts: RecognizeOptions,
    pad_ratio: f32,
    capacity: usize,
) -> Receiver<StreamEvent> {
    let (tx, rx) = mpsc::sync_channel(capacity);
    thread::spawn(move || produce(tx, &registry, &image, &regions, &opts, pad_ratio));
    rx
}

/// Produces the event sequence for one request.
///
/// Emits exactly one progress event per input region, in input order,
/// followed by one completion event. Every failure mode is region-local:
/// an empty crop emits an `invalid_box` error event, and both per-call
/// engine failures and engine construction failures emit an error event
/// carrying the message, so the stream always terminates with the
/// completion event.
pub(crate) fn produce(
    tx: SyncSender<StreamEvent>,
    registry: &EngineRegistry,
    image: &RgbImage,
    regions: &[Region],
    opts: &RecognizeOptions,
    pad_ratio: f32,
) {
    let total = regions.len();
    let mut tracker = ProgressTracker::new(total);

    for region in regions {
        let box_id = if region.id.is_empty() {
            mint_region_id()
        } else {
            region.id.clone()
        };
        let engine_kind = route_engine(region.kind, &opts.routing, opts.language.as_deref());
        let started = Instant::now();

        let event = match recognize_region(
            registry,
            image,
            region,
            engine_kind,
            opts.language.as_deref(),
            pad_ratio,
        ) {
            Ok(RegionOutcome::Text(text)) => {
                tracker.record_done();
                debug!(
                    box_id = %box_id,
                    chars = text.chars().count(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    progress = %tracker.progress_label(),
                    eta_ms = tracker.eta_ms(),
                    "stream region done"
                );
                StreamEvent::done(box_id, text)
            }
            Ok(RegionOutcome::Failed(failure)) => StreamEvent::error(box_id, failure.reason),
            Err(error) => StreamEvent::error(box_id, error.to_string()),
        };

        if tx.send(event).is_err() {
            debug!("stream consumer disconnected, stopping");
            return;
        }
    }

    // The consumer may be gone already; completion is best-effort then.
    let _ = tx.send(StreamEvent::complete(total));
}
