//! Dispatch core: validates a request, runs it on the worker pool and
//! classifies the outcome.

mod pool;

pub use pool::{PoolStats, WorkHandle, WorkItem, WorkerPool, DEFAULT_WORKERS};

use std::time::Instant;

use axum::http::StatusCode;
use docgate_extractors::{BackendKind, ExtractError, ExtractionOutput, ExtractionRequest, ExtractorRegistry};
use thiserror::Error;
use tracing::{info, warn};

/// A backend failure, tagged with the backend that produced it.
#[derive(Debug, Error)]
#[error("Error processing {backend}: {source}")]
pub struct DispatchError {
    pub backend: BackendKind,
    pub source: ExtractError,
}

impl DispatchError {
    pub fn new(backend: BackendKind, source: ExtractError) -> Self {
        Self { backend, source }
    }

    /// HTTP status for this failure.
    ///
    /// Caller mistakes are 400, vendor trouble is 502/504, and anything
    /// wrong with the gateway itself is 500.
    pub fn status(&self) -> StatusCode {
        match self.source {
            ExtractError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ExtractError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ExtractError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ExtractError::Configuration(_) | ExtractError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Routes requests to their extractor through the worker pool.
pub struct Dispatcher {
    registry: ExtractorRegistry,
    pool: WorkerPool,
}

impl Dispatcher {
    pub fn new(registry: ExtractorRegistry, pool: WorkerPool) -> Self {
        Self { registry, pool }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Run one request to completion.
    ///
    /// Invalid requests fail here without touching the pool. Otherwise
    /// the request is queued and this call suspends once, until the
    /// worker delivers the result.
    pub async fn dispatch(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionOutput, DispatchError> {
        let backend = request.kind();
        request
            .validate()
            .map_err(|e| DispatchError::new(backend, e))?;

        let extractor = self.registry.get(backend).ok_or_else(|| {
            DispatchError::new(
                backend,
                ExtractError::internal(format!("no extractor registered for {}", backend)),
            )
        })?;

        let payload_len = request.payload_len();
        let handle = self
            .pool
            .submit(request, extractor)
            .map_err(|e| DispatchError::new(backend, e))?;
        let request_id = handle.id();
        let started = Instant::now();

        match handle.wait().await {
            Ok(output) => {
                info!(
                    request_id = %request_id,
                    backend = %backend,
                    payload_len,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Extraction succeeded"
                );
                Ok(output)
            }
            Err(e) => {
                let err = DispatchError::new(backend, e);
                warn!(
                    request_id = %request_id,
                    backend = %backend,
                    status = err.status().as_u16(),
                    error = %err.source,
                    "Extraction failed"
                );
                Err(err)
            }
        }
    }
}
