//! docgate-extractors - Extraction backend adapters for the docgate gateway.
//!
//! Every backend implements the [`Extractor`] trait: it receives an
//! [`ExtractionRequest`] and returns either extracted text or a structured
//! JSON value, reporting failures as [`ExtractError`].
//!
//! # Backends
//!
//! - Spreadsheets via calamine (xlsx, xlsm, xlsb, xls, ods)
//! - PDF text via pdf-extract
//! - Image OCR via the Google Cloud Vision REST API
//! - Structured data via OpenAI chat completions
//!
//! # Example
//!
//! ```ignore
//! use docgate_extractors::{ChatConfig, ExtractionRequest, ExtractorRegistry, VisionConfig};
//!
//! let registry = ExtractorRegistry::with_defaults(ChatConfig::from_env(), VisionConfig::from_env());
//! let request = ExtractionRequest::pdf(pdf_bytes);
//! let extractor = registry.get(request.kind()).unwrap();
//! let output = extractor.extract(&request).await?;
//! ```

mod config;
mod error;
mod ocr;
mod openai;
mod pdf;
mod registry;
mod spreadsheet;
mod structured;
mod types;
mod vision;

pub use config::{ChatConfig, VisionConfig, DEFAULT_CHAT_MODEL, DEFAULT_VISION_ENDPOINT};
pub use error::{ExtractError, ExtractResult};
pub use ocr::{detect_format, OcrExtractor, TextDetector};
pub use openai::OpenAiChatModel;
pub use pdf::PdfExtractor;
pub use registry::ExtractorRegistry;
pub use spreadsheet::SpreadsheetExtractor;
pub use structured::{
    parse_model_reply, ChatModel, StructuredDataExtractor, JSON_SYSTEM_PROMPT,
    SOFT_FAILURE_MESSAGE,
};
pub use types::{BackendKind, ExtractionOutput, ExtractionRequest, ExtractionResult, SheetRange};
pub use vision::GoogleVisionDetector;

use async_trait::async_trait;

/// Core Extractor trait - every extraction backend implements this.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Run the backend on a request of this extractor's kind.
    ///
    /// Requests of any other kind are rejected as invalid input.
    async fn extract(&self, request: &ExtractionRequest) -> ExtractResult<ExtractionOutput>;

    /// Backend kind served by this extractor.
    fn kind(&self) -> BackendKind;

    /// Human-readable name for this extractor.
    fn name(&self) -> &str;
}
