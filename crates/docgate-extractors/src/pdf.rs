//! PDF content extraction using pdf-extract.

use async_trait::async_trait;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{BackendKind, ExtractionOutput, ExtractionRequest};
use crate::Extractor;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// PDF content extractor using pdf-extract library.
///
/// Extracts the text of every page in document order, wrapping the
/// synchronous pdf-extract call in spawn_blocking to avoid blocking the
/// async runtime.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(content: Vec<u8>) -> ExtractResult<String> {
        // Readers tolerate up to 1024 bytes of junk before the header.
        let window = &content[..content.len().min(1024)];
        if !window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
            return Err(ExtractError::invalid_input("not a PDF document"));
        }

        pdf_extract::extract_text_from_mem(&content)
            .map_err(|e| ExtractError::invalid_input(format!("failed to parse PDF: {}", e)))
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> ExtractResult<ExtractionOutput> {
        let ExtractionRequest::Pdf { content } = request else {
            return Err(ExtractError::invalid_input(format!(
                "{} extractor cannot handle {} requests",
                self.name(),
                request.kind()
            )));
        };
        if content.is_empty() {
            return Err(ExtractError::invalid_input("PDF is empty"));
        }

        let content = content.clone();
        let text = tokio::task::spawn_blocking(move || Self::extract_sync(content))
            .await
            .map_err(|e| ExtractError::invalid_input(format!("PDF parser crashed: {}", e)))??;

        Ok(ExtractionOutput::Text(text))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Pdf
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}
