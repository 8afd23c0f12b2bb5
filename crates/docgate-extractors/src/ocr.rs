//! Image OCR extraction.
//!
//! The extractor validates the image locally and hands the bytes to a
//! [`TextDetector`], returning the detector's full annotation structure
//! (text blocks, bounding polygons, full-text annotation) untouched.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{BackendKind, ExtractionOutput, ExtractionRequest};
use crate::Extractor;

/// Remote text detection service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Run text detection and return the raw annotation response.
    async fn detect_text(&self, image: &[u8]) -> ExtractResult<serde_json::Value>;
}

/// Detect image format from bytes (magic number detection).
pub fn detect_format(content: &[u8]) -> ExtractResult<&'static str> {
    if content.len() < 8 {
        return Err(ExtractError::invalid_input(
            "content too short to be an image",
        ));
    }

    if content.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Ok("png")
    } else if content.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Ok("jpeg")
    } else if content.starts_with(b"GIF87a") || content.starts_with(b"GIF89a") {
        Ok("gif")
    } else if content.starts_with(b"RIFF") && content.len() > 12 && &content[8..12] == b"WEBP" {
        Ok("webp")
    } else if content.starts_with(b"BM") {
        Ok("bmp")
    } else if content.starts_with(b"II*\0") || content.starts_with(b"MM\0*") {
        Ok("tiff")
    } else if content.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        Ok("ico")
    } else {
        Err(ExtractError::invalid_input("unrecognized image format"))
    }
}

/// OCR extractor backed by a [`TextDetector`].
pub struct OcrExtractor {
    detector: Arc<dyn TextDetector>,
}

impl OcrExtractor {
    pub fn new(detector: Arc<dyn TextDetector>) -> Self {
        Self { detector }
    }
}

#[async_trait]
impl Extractor for OcrExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> ExtractResult<ExtractionOutput> {
        let ExtractionRequest::Image { content } = request else {
            return Err(ExtractError::invalid_input(format!(
                "{} extractor cannot handle {} requests",
                self.name(),
                request.kind()
            )));
        };

        let format = detect_format(content)?;
        tracing::debug!(format, size = content.len(), "Running text detection");

        let annotations = self.detector.detect_text(content).await?;
        if !annotations.is_object() {
            return Err(ExtractError::upstream(
                "text detection returned a non-object response",
            ));
        }

        Ok(ExtractionOutput::Structured(annotations))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Image
    }

    fn name(&self) -> &str {
        "ocr"
    }
}
