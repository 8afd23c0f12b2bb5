//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use docgate_extractors::{
    BackendKind, ExtractError, ExtractResult, ExtractionOutput, ExtractionRequest, Extractor,
    ExtractorRegistry,
};
use docgate_server::{auth::StaticTokenVerifier, create_server, AppState, Dispatcher, WorkerPool};
use serde_json::Value;
use tower::ServiceExt;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

pub const TOKEN: &str = "test-token";
pub const BOUNDARY: &str = "docgate-test-boundary";

/// Extractor that records how often and how concurrently it was called.
pub struct SpyExtractor {
    kind: BackendKind,
    delay: Duration,
    output: ExtractionOutput,
    calls: AtomicUsize,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl SpyExtractor {
    pub fn new(kind: BackendKind, output: ExtractionOutput) -> Self {
        Self {
            kind,
            delay: Duration::ZERO,
            output,
            calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for SpyExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> ExtractResult<ExtractionOutput> {
        if request.kind() != self.kind {
            return Err(ExtractError::invalid_input("wrong request kind"));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn name(&self) -> &str {
        "spy"
    }
}

/// Build the full application around `registry`.
pub fn app(registry: ExtractorRegistry, workers: usize, timeout: Option<Duration>) -> Router {
    let dispatcher = Dispatcher::new(registry, WorkerPool::new(workers, timeout));
    let verifier = Arc::new(StaticTokenVerifier::new([TOKEN]));
    create_server(AppState::new(dispatcher, verifier))
}

/// Build the application with a custom upload limit.
pub fn app_with_limit(registry: ExtractorRegistry, limit: usize) -> Router {
    let dispatcher = Dispatcher::new(registry, WorkerPool::new(2, None));
    let verifier = Arc::new(StaticTokenVerifier::new([TOKEN]));
    create_server(AppState::new(dispatcher, verifier).with_upload_limit(limit))
}

/// Multipart body carrying one `file` field.
pub fn multipart_body(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Multipart upload request, optionally authenticated.
pub fn upload_request(uri: &str, token: Option<&str>, filename: &str, content: &[u8]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(multipart_body(filename, content)))
        .unwrap()
}

/// JSON request, optionally authenticated.
pub fn json_request(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Send a request and decode the JSON response.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Minimal xlsx workbook: one sheet per entry, one text cell per row.
pub fn build_workbook(sheets: &[&[&str]]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut overrides = String::new();
    let mut entries = String::new();
    let mut rels = String::new();
    for idx in 1..=sheets.len() {
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{idx}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        entries.push_str(&format!(
            r#"<sheet name="Sheet{idx}" sheetId="{idx}" r:id="rId{idx}"/>"#
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{idx}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{idx}.xml"/>"#
        ));
    }

    let mut files = vec![
        (
            "[Content_Types].xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
            ),
        ),
        (
            "_rels/.rels".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                .to_string(),
        ),
        (
            "xl/workbook.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{entries}</sheets></workbook>"#
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        ),
    ];

    for (idx, rows) in sheets.iter().enumerate() {
        let data: String = rows
            .iter()
            .enumerate()
            .map(|(r, text)| {
                format!(
                    r#"<row r="{n}"><c r="A{n}" t="inlineStr"><is><t>{text}</t></is></c></row>"#,
                    n = r + 1
                )
            })
            .collect();
        files.push((
            format!("xl/worksheets/sheet{}.xml", idx + 1),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
            ),
        ));
    }

    for (name, body) in files {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
