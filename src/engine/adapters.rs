//! Per-engine adapters normalizing provider call signatures.
//!
//! Providers differ in what they accept: the script-specialized
//! recognizer takes only the raster, while the vision-language engine
//! understands a language hint and a generation budget. Each adapter
//! implements the uniform [`TextRecognizer`] surface and forwards exactly
//! the fields its provider supports, dropping the rest. Argument
//! compatibility lives here, never at the call site.

use super::{InferRequest, TextRecognizer};
use crate::core::OcrResult;
use image::RgbImage;

/// Provider boundary for script-specialized recognizers: raster in,
/// raw text out.
pub trait ScriptRecognitionProvider: Send + Sync {
    /// Recognizes the text in a crop.
    fn recognize(&self, crop: &RgbImage) -> OcrResult<String>;
}

/// Provider boundary for vision-language recognizers.
pub trait VisionLanguageProvider: Send + Sync {
    /// Recognizes the text in a crop, honoring a language hint and a
    /// generation budget when given.
    fn recognize(
        &self,
        crop: &RgbImage,
        language: Option<&str>,
        max_new_tokens: Option<u32>,
    ) -> OcrResult<String>;
}

/// Adapter for recognizers that accept only the cropped raster.
///
/// Language hints and generation budgets are not part of the wrapped
/// provider's signature and are dropped here.
pub struct ScriptRecognizerAdapter<P> {
    provider: P,
}

impl<P: ScriptRecognitionProvider> ScriptRecognizerAdapter<P> {
    /// Wraps a script-recognition provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ScriptRecognitionProvider> TextRecognizer for ScriptRecognizerAdapter<P> {
    fn recognize(&self, crop: &RgbImage, _request: &InferRequest) -> OcrResult<String> {
        self.provider.recognize(crop)
    }
}

/// Adapter forwarding the full request to a vision-language provider.
pub struct VisionLanguageAdapter<P> {
    provider: P,
}

impl<P: VisionLanguageProvider> VisionLanguageAdapter<P> {
    /// Wraps a vision-language provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: VisionLanguageProvider> TextRecognizer for VisionLanguageAdapter<P> {
    fn recognize(&self, crop: &RgbImage, request: &InferRequest) -> OcrResult<String> {
        self.provider
            .recognize(crop, request.language.as_deref(), request.max_new_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingVlProvider {
        seen: Mutex<Vec<(Option<String>, Option<u32>)>>,
    }

    impl VisionLanguageProvider for RecordingVlProvider {
        fn recognize(
            &self,
            _crop: &RgbImage,
            language: Option<&str>,
            max_new_tokens: Option<u32>,
        ) -> OcrResult<String> {
            self.seen
                .lock()
                .unwrap()
                .push((language.map(str::to_string), max_new_tokens));
            Ok("text".to_string())
        }
    }

    struct CropOnlyProvider;

    impl ScriptRecognitionProvider for CropOnlyProvider {
        fn recognize(&self, crop: &RgbImage) -> OcrResult<String> {
            Ok(format!("{}x{}", crop.width(), crop.height()))
        }
    }

    #[test]
    fn script_adapter_drops_request_fields() {
        let adapter = ScriptRecognizerAdapter::new(CropOnlyProvider);
        let request = InferRequest {
            language: Some("ja".to_string()),
            max_new_tokens: Some(64),
        };
        let crop = RgbImage::new(12, 8);
        assert_eq!(adapter.recognize(&crop, &request).unwrap(), "12x8");
    }

    #[test]
    fn vision_language_adapter_forwards_everything() {
        let adapter = VisionLanguageAdapter::new(RecordingVlProvider {
            seen: Mutex::new(Vec::new()),
        });
        let request = InferRequest {
            language: Some("en".to_string()),
            max_new_tokens: Some(42),
        };
        adapter.recognize(&RgbImage::new(4, 4), &request).unwrap();
        let seen = adapter.provider.seen.lock().unwrap();
        assert_eq!(seen[0], (Some("en".to_string()), Some(42)));
    }
}
