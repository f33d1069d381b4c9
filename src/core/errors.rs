//! Error types for the OCR pipeline.
//!
//! The taxonomy distinguishes conditions the caller must see (`NotFound`,
//! `InvalidInput`, `EngineUnavailable`) from per-region failures that the
//! pipeline recovers locally. Engine construction errors are request-fatal;
//! per-region inference errors never are (see [`crate::pipeline`]).

use crate::engine::EngineKind;
use thiserror::Error;

/// Enum representing the errors that can surface from the OCR pipeline.
#[derive(Error, Debug)]
pub enum OcrError {
    /// A referenced image or cache record does not exist. Non-retryable.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource.
        what: String,
    },

    /// Malformed request data, rejected before any engine work begins.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Engine construction failed even after the fallback cascade.
    #[error("{kind} engine unavailable: {message}")]
    EngineUnavailable {
        /// The engine that could not be constructed.
        kind: EngineKind,
        /// Description of the final failure.
        message: String,
    },

    /// A provider-specific failure during a single inference call.
    ///
    /// Recovered per region by the pipeline; never aborts sibling regions.
    #[error("{kind} inference failed")]
    Engine {
        /// The engine that failed.
        kind: EngineKind,
        /// The underlying provider error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred while loading or decoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error from (de)serializing regions, cache records, or events.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for OCR operations.
pub type OcrResult<T> = Result<T, OcrError>;

impl OcrError {
    /// Creates a `NotFound` error for a missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        OcrError::NotFound { what: what.into() }
    }

    /// Creates an `InvalidInput` error with the given message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        OcrError::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an `EngineUnavailable` error for a failed construction.
    pub fn engine_unavailable(kind: EngineKind, message: impl Into<String>) -> Self {
        OcrError::EngineUnavailable {
            kind,
            message: message.into(),
        }
    }

    /// Creates an `Engine` error wrapping a provider failure.
    pub fn engine(
        kind: EngineKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        OcrError::Engine {
            kind,
            source: source.into(),
        }
    }
}
