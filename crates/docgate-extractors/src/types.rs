//! Core types for extraction requests and results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

/// Which backend a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Spreadsheet workbook parsing.
    Spreadsheet,
    /// PDF text extraction.
    Pdf,
    /// OCR through a remote vision API.
    Image,
    /// LLM-based structured data extraction.
    StructuredText,
}

impl BackendKind {
    /// All kinds, in route order.
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Spreadsheet,
        BackendKind::Pdf,
        BackendKind::Image,
        BackendKind::StructuredText,
    ];

    /// Human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Spreadsheet => "spreadsheet",
            BackendKind::Pdf => "PDF",
            BackendKind::Image => "image",
            BackendKind::StructuredText => "structured data",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sheet and row window for spreadsheet extraction.
///
/// Rows are 1-indexed and inclusive on both ends. `end_row = None`
/// means "through the last row of the sheet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRange {
    pub sheet_index: usize,
    pub start_row: usize,
    pub end_row: Option<usize>,
}

impl SheetRange {
    /// Build a validated range.
    pub fn new(sheet_index: usize, start_row: usize, end_row: Option<usize>) -> ExtractResult<Self> {
        let range = Self {
            sheet_index,
            start_row,
            end_row,
        };
        range.validate()?;
        Ok(range)
    }

    /// Check the row invariants.
    pub fn validate(&self) -> ExtractResult<()> {
        if self.start_row < 1 {
            return Err(ExtractError::invalid_input("start_row must be at least 1"));
        }
        if let Some(end) = self.end_row {
            if end < self.start_row {
                return Err(ExtractError::invalid_input(format!(
                    "end_row ({}) must not be less than start_row ({})",
                    end, self.start_row
                )));
            }
        }
        Ok(())
    }

    /// Whether a 1-indexed row number falls inside the window.
    pub fn contains(&self, row: usize) -> bool {
        row >= self.start_row && self.end_row.map_or(true, |end| row <= end)
    }
}

impl Default for SheetRange {
    fn default() -> Self {
        Self {
            sheet_index: 0,
            start_row: 1,
            end_row: None,
        }
    }
}

/// A single extraction job as accepted by the gateway.
#[derive(Debug, Clone)]
pub enum ExtractionRequest {
    /// Binary workbook plus the window to read.
    Spreadsheet { content: Vec<u8>, range: SheetRange },
    /// Binary PDF document.
    Pdf { content: Vec<u8> },
    /// Binary image for OCR.
    Image { content: Vec<u8> },
    /// Free text to mine for structured data.
    StructuredText { message: String },
}

impl ExtractionRequest {
    pub fn spreadsheet(content: impl Into<Vec<u8>>, range: SheetRange) -> Self {
        Self::Spreadsheet {
            content: content.into(),
            range,
        }
    }

    pub fn pdf(content: impl Into<Vec<u8>>) -> Self {
        Self::Pdf {
            content: content.into(),
        }
    }

    pub fn image(content: impl Into<Vec<u8>>) -> Self {
        Self::Image {
            content: content.into(),
        }
    }

    pub fn structured_text(message: impl Into<String>) -> Self {
        Self::StructuredText {
            message: message.into(),
        }
    }

    /// Backend this request must be routed to.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Spreadsheet { .. } => BackendKind::Spreadsheet,
            Self::Pdf { .. } => BackendKind::Pdf,
            Self::Image { .. } => BackendKind::Image,
            Self::StructuredText { .. } => BackendKind::StructuredText,
        }
    }

    /// Size of the payload in bytes.
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Spreadsheet { content, .. } | Self::Pdf { content } | Self::Image { content } => {
                content.len()
            }
            Self::StructuredText { message } => message.len(),
        }
    }

    /// Check the per-kind invariants before the request is dispatched.
    pub fn validate(&self) -> ExtractResult<()> {
        if self.payload_len() == 0 {
            return Err(ExtractError::invalid_input("payload is empty"));
        }
        match self {
            Self::Spreadsheet { range, .. } => range.validate(),
            Self::StructuredText { message } if message.trim().is_empty() => {
                Err(ExtractError::invalid_input("message is blank"))
            }
            _ => Ok(()),
        }
    }
}

/// Successful output of a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionOutput {
    /// Plain extracted text.
    Text(String),
    /// Structured mapping (OCR annotations, model JSON).
    Structured(serde_json::Value),
}

impl ExtractionOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Text(_) => None,
            Self::Structured(value) => Some(value),
        }
    }

    /// Convert into a JSON value for the response envelope.
    pub fn into_value(self) -> serde_json::Value {
        match self {
            Self::Text(text) => serde_json::Value::String(text),
            Self::Structured(value) => value,
        }
    }
}

/// Outcome of one extraction: exactly one of output or failure.
pub type ExtractionResult = ExtractResult<ExtractionOutput>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_range_defaults() {
        let range = SheetRange::default();
        assert_eq!(range.sheet_index, 0);
        assert_eq!(range.start_row, 1);
        assert!(range.end_row.is_none());
        assert!(range.contains(1));
        assert!(range.contains(10_000));
    }

    #[test]
    fn test_sheet_range_rejects_inverted_window() {
        assert!(SheetRange::new(0, 0, None).is_err());
        assert!(SheetRange::new(0, 5, Some(4)).is_err());
        assert!(SheetRange::new(0, 5, Some(5)).is_ok());
    }

    #[test]
    fn test_sheet_range_contains_is_inclusive() {
        let range = SheetRange::new(1, 2, Some(4)).unwrap();
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
    }

    #[test]
    fn test_request_kind_and_validation() {
        let pdf = ExtractionRequest::pdf(Vec::new());
        assert_eq!(pdf.kind(), BackendKind::Pdf);
        assert!(pdf.validate().is_err());

        let text = ExtractionRequest::structured_text("   ");
        assert!(text.validate().is_err());

        let text = ExtractionRequest::structured_text("invoice 42 due friday");
        assert_eq!(text.kind(), BackendKind::StructuredText);
        assert!(text.validate().is_ok());
    }

    #[test]
    fn test_output_serializes_untagged() {
        let text = ExtractionOutput::Text("hello".to_string());
        assert_eq!(serde_json::to_value(&text).unwrap(), serde_json::json!("hello"));

        let structured = ExtractionOutput::Structured(serde_json::json!({"a": 1}));
        assert_eq!(structured.into_value(), serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_backend_labels() {
        assert_eq!(BackendKind::Spreadsheet.to_string(), "spreadsheet");
        assert_eq!(BackendKind::StructuredText.label(), "structured data");
    }
}
