//! Region data model: rectangles, semantic kinds, and resize metadata.
//!
//! Regions travel through the pipeline in one of two coordinate spaces:
//! *normalized* (fractions of image width/height, invariant under uniform
//! resize) or *pixel* (tied to a specific resolution). The space is
//! determined by the producing stage; conversion between the two is always
//! explicit via [`crate::processors::geometry`].

use serde::{Deserialize, Serialize};

/// Semantic class of a detected region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RegionKind {
    /// A speech bubble containing dialogue text.
    TextBubble,
    /// Sound-effect lettering drawn into the artwork.
    Sounds,
    /// Anything else; unknown inbound labels map here.
    #[default]
    Other,
}

impl From<String> for RegionKind {
    fn from(label: String) -> Self {
        RegionKind::from_label(&label)
    }
}

impl RegionKind {
    /// Maps a detector label to a region kind. Unknown labels become
    /// [`RegionKind::Other`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "text_bubble" => RegionKind::TextBubble,
            "sounds" => RegionKind::Sounds,
            _ => RegionKind::Other,
        }
    }
}

/// A candidate text area: rectangle plus semantic kind and confidence.
///
/// Immutable once produced; a fresh id is minted only when a consumer
/// receives a region without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Opaque identifier. Empty when the producer did not supply one.
    #[serde(default)]
    pub id: String,
    /// Semantic class of the region.
    #[serde(rename = "type", default)]
    pub kind: RegionKind,
    /// Detector confidence in `[0, 1]`, when known.
    #[serde(default)]
    pub score: Option<f32>,
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

/// A half-open rectangle in pixel coordinates.
///
/// Producers guarantee `x2 > x1` and `y2 > y1` except for the soft-failure
/// zero rectangle, which callers detect with [`PixelRect::is_empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge, inclusive.
    pub x1: u32,
    /// Top edge, inclusive.
    pub y1: u32,
    /// Right edge, exclusive.
    pub x2: u32,
    /// Bottom edge, exclusive.
    pub y2: u32,
}

impl PixelRect {
    /// The zero-area rectangle used as a soft failure value.
    pub const ZERO: PixelRect = PixelRect {
        x1: 0,
        y1: 0,
        x2: 0,
        y2: 0,
    };

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Returns true when the rectangle encloses no pixels.
    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }
}

/// Resize bookkeeping produced once per image per request.
///
/// Resizing is uniform and never upscales, so normalized coordinates
/// computed against `resized_size` equal those computed against
/// `orig_size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeMetadata {
    /// Original image dimensions `(width, height)`.
    pub orig_size: (u32, u32),
    /// Dimensions after the model-facing resize.
    pub resized_size: (u32, u32),
    /// Applied scale factor in `(0, 1]`.
    pub scale: f32,
}

/// Persisted detection state for one image, stored as a sidecar record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// The image this record belongs to.
    pub file_id: String,
    /// Unix timestamp of the last write, in seconds.
    pub saved_at: f64,
    /// The cached regions, normalized.
    pub boxes: Vec<Region>,
    /// Resize metadata from the producing detection run, when known.
    #[serde(default)]
    pub meta: Option<ResizeMetadata>,
}
