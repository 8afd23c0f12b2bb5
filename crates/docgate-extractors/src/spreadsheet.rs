//! Spreadsheet text extraction using calamine.

use std::io::Cursor;

use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::error::{ExtractError, ExtractResult};
use crate::types::{BackendKind, ExtractionOutput, ExtractionRequest, SheetRange};
use crate::Extractor;

/// Spreadsheet extractor.
///
/// Reads one sheet of a workbook (xlsx, xlsm, xlsb, xls or ods, detected
/// from the bytes) and renders the selected rows as text: non-empty cells
/// joined by a single space, every row terminated by `\n`.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetExtractor;

impl SpreadsheetExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract text synchronously (called within spawn_blocking).
    fn extract_sync(content: Vec<u8>, range: SheetRange) -> ExtractResult<String> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))
            .map_err(|e| ExtractError::invalid_input(format!("failed to open workbook: {}", e)))?;

        let sheet_count = workbook.sheet_names().len();
        let sheet = workbook
            .worksheet_range_at(range.sheet_index)
            .ok_or_else(|| {
                ExtractError::invalid_input(format!(
                    "sheet index {} out of range (workbook has {} sheet{})",
                    range.sheet_index,
                    sheet_count,
                    if sheet_count == 1 { "" } else { "s" }
                ))
            })?
            .map_err(|e| ExtractError::invalid_input(format!("failed to read sheet: {}", e)))?;

        Ok(render_rows(&sheet, &range))
    }
}

/// Render the rows of `sheet` that fall inside `range`.
///
/// Row numbers are absolute sheet rows, so a window starting at row 3
/// reads the sheet's third row even when the used area begins later.
fn render_rows(sheet: &Range<Data>, range: &SheetRange) -> String {
    let first_row = sheet.start().map_or(0, |(row, _)| row as usize);
    let mut text = String::new();

    for (offset, row) in sheet.rows().enumerate() {
        let row_number = first_row + offset + 1;
        if let Some(end) = range.end_row {
            if row_number > end {
                break;
            }
        }
        if !range.contains(row_number) {
            continue;
        }

        let cells: Vec<String> = row
            .iter()
            .filter(|cell| !matches!(cell, Data::Empty))
            .map(|cell| cell.to_string())
            .filter(|value| !value.is_empty())
            .collect();

        text.push_str(&cells.join(" "));
        text.push('\n');
    }

    text
}

#[async_trait]
impl Extractor for SpreadsheetExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> ExtractResult<ExtractionOutput> {
        let ExtractionRequest::Spreadsheet { content, range } = request else {
            return Err(ExtractError::invalid_input(format!(
                "{} extractor cannot handle {} requests",
                self.name(),
                request.kind()
            )));
        };
        if content.is_empty() {
            return Err(ExtractError::invalid_input("workbook is empty"));
        }
        range.validate()?;

        let content = content.clone();
        let range = *range;
        let text = tokio::task::spawn_blocking(move || Self::extract_sync(content, range))
            .await
            .map_err(|e| ExtractError::invalid_input(format!("workbook parser crashed: {}", e)))??;

        Ok(ExtractionOutput::Text(text))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Spreadsheet
    }

    fn name(&self) -> &str {
        "calamine"
    }
}
