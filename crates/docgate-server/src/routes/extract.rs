//! Extraction endpoints.
//!
//! Handlers only check the request shape; every backend call goes
//! through the dispatcher.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Multipart, Query, State,
    },
    http::StatusCode,
    Json,
};
use docgate_extractors::{ExtractionOutput, ExtractionRequest, SheetRange};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Name of the multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Success envelope shared by every extraction route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    /// Extracted text, or the backend's structured mapping.
    pub text: ExtractionOutput,
}

/// Query parameters for spreadsheet extraction.
#[derive(Debug, Default, Deserialize)]
pub struct SheetQuery {
    pub sheet_index: Option<i64>,
    pub start_row: Option<i64>,
    pub end_row: Option<i64>,
}

impl SheetQuery {
    /// Validate and convert into a [`SheetRange`].
    pub fn into_range(self) -> ApiResult<SheetRange> {
        let sheet_index = self.sheet_index.unwrap_or(0);
        if sheet_index < 0 {
            return Err(ApiError::bad_request("sheet_index must be 0 or greater"));
        }
        let start_row = self.start_row.unwrap_or(1);
        if start_row < 1 {
            return Err(ApiError::bad_request("start_row must be 1 or greater"));
        }
        let end_row = match self.end_row {
            Some(end) if end < start_row => {
                return Err(ApiError::bad_request(
                    "end_row must be greater than or equal to start_row",
                ))
            }
            Some(end) => Some(end as usize),
            None => None,
        };

        SheetRange::new(sheet_index as usize, start_row as usize, end_row)
            .map_err(|e| ApiError::bad_request(e.to_string()))
    }
}

/// Request body for structured data extraction.
#[derive(Debug, Deserialize)]
pub struct ExtractDataRequest {
    /// The text to extract data from.
    pub message: String,
}

/// A file received through multipart upload.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Uploaded file is too large")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Read the `file` field of a multipart body.
async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Upload> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) || upload.is_some() {
            // Drain fields we do not use.
            field.bytes().await.map_err(multipart_error)?;
            continue;
        }

        let filename = field.file_name().unwrap_or_default().trim().to_string();
        if filename.is_empty() {
            return Err(ApiError::bad_request("Empty file name"));
        }
        let content = field.bytes().await.map_err(multipart_error)?.to_vec();

        debug!(filename = %filename, size = content.len(), "Received upload");
        upload = Some(Upload { filename, content });
    }

    upload.ok_or_else(|| ApiError::bad_request(format!("{} field is required", FILE_FIELD)))
}

async fn respond(state: &AppState, request: ExtractionRequest) -> ApiResult<Json<ExtractResponse>> {
    let text = state.dispatcher.dispatch(request).await?;
    Ok(Json(ExtractResponse { text }))
}

/// Extract text from a spreadsheet.
/// POST /api/extract-text-from-xlsx
pub async fn extract_xlsx(
    State(state): State<AppState>,
    query: Result<Query<SheetQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ExtractResponse>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let range = query.into_range()?;
    let upload = read_upload(multipart).await?;

    respond(&state, ExtractionRequest::spreadsheet(upload.content, range)).await
}

/// Extract text from a PDF.
/// POST /api/extract-text-from-pdf
pub async fn extract_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ExtractResponse>> {
    let upload = read_upload(multipart).await?;
    respond(&state, ExtractionRequest::pdf(upload.content)).await
}

/// Run OCR over an image.
/// POST /api/extract-text-from-image
pub async fn extract_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ExtractResponse>> {
    let upload = read_upload(multipart).await?;
    respond(&state, ExtractionRequest::image(upload.content)).await
}

/// Extract structured data from free text.
/// POST /api/extract-important-data
pub async fn extract_data(
    State(state): State<AppState>,
    payload: Result<Json<ExtractDataRequest>, JsonRejection>,
) -> ApiResult<Json<ExtractResponse>> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if payload.message.trim().is_empty() {
        return Err(ApiError::bad_request("message parameter is required"));
    }

    respond(&state, ExtractionRequest::structured_text(payload.message)).await
}
