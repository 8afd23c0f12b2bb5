//! Server state management.

use std::sync::Arc;

use docgate_extractors::ExtractorRegistry;

use crate::auth::{StaticTokenVerifier, TokenVerifier};
use crate::config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::dispatch::{Dispatcher, WorkerPool};

/// Shared application state.
///
/// Everything inside is read-only after start-up; the worker pool's
/// queue is the only thing requests contend on.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create state from its parts.
    pub fn new(dispatcher: Dispatcher, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            verifier,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Build the worker pool and token verifier described by `config`.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn from_config(config: &ServerConfig, registry: ExtractorRegistry) -> Self {
        let pool = WorkerPool::new(config.workers, config.backend_timeout);
        let verifier = StaticTokenVerifier::new(config.api_tokens.iter().cloned());

        Self::new(Dispatcher::new(registry, pool), Arc::new(verifier))
            .with_upload_limit(config.max_upload_bytes)
    }

    /// Override the request body limit.
    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}
