//! Core error handling and configuration for the OCR pipeline.

pub mod config;
pub mod errors;

pub use config::{DeviceConfig, PipelineConfig};
pub use errors::{OcrError, OcrResult};
