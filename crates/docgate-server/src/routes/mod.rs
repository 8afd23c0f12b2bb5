//! Route definitions for the REST API.

mod extract;
mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Create the main application router.
///
/// Everything under `/api` sits behind the bearer-token gate; `/health`
/// stays open for liveness checks.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/extract-text-from-xlsx", post(extract::extract_xlsx))
        .route("/extract-text-from-pdf", post(extract::extract_pdf))
        .route("/extract-text-from-image", post(extract::extract_image))
        .route("/extract-important-data", post(extract::extract_data))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

pub use extract::*;
pub use health::*;
